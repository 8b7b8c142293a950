//! The answer pipeline: Guardrail -> Route -> Generate -> Judge -> Respond.
//!
//! Stages run in a fixed order, once per request. Every stage owns its
//! failure handling: a broken capability substitutes that stage's fallback
//! and the machine always reaches Respond - no internal error crosses the
//! pipeline boundary.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::context::{normalize_contexts, ContextSource};
use crate::domain::memory::record_exchange;
use crate::domain::routing::{RouteTag, Router};
use crate::domain::validation::ValidationInput;
use crate::domain::SessionMemory;
use crate::infrastructure::specialists::{SpecialistAnswer, SpecialistRegistry};
use crate::infrastructure::validation::FallbackValidator;

/// Fixed user-facing apology when even the fallback specialist fails
const APOLOGY_ANSWER: &str = "Sorry, I could not process your question right now.";

/// Fixed rejection when the guardrail blocks a query without a message
const REJECTION_ANSWER: &str = "Sorry, I cannot help with that request.";

/// One question entering the pipeline
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub query: String,
    pub session_id: Option<String>,
    /// Caller-chosen specialist; `None` routes automatically
    pub route_hint: Option<RouteTag>,
    /// Caller-supplied context, bypassing retrieval in the specialist
    pub contexts: Option<Vec<ContextSource>>,
}

impl PipelineRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            session_id: None,
            route_hint: None,
            contexts: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_route_hint(mut self, route: RouteTag) -> Self {
        self.route_hint = Some(route);
        self
    }

    pub fn with_contexts(mut self, contexts: Vec<ContextSource>) -> Self {
        self.contexts = Some(contexts);
        self
    }
}

/// What the pipeline hands back to the caller
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub answer: String,
    pub contexts: Vec<String>,
    pub route: RouteTag,
}

/// The orchestrator wiring guardrail, router, specialists and judge
#[derive(Debug)]
pub struct ChatPipeline {
    guardrail: FallbackValidator,
    judge: FallbackValidator,
    router: Arc<dyn Router>,
    specialists: SpecialistRegistry,
    memory: Arc<dyn SessionMemory>,
}

impl ChatPipeline {
    pub fn new(
        guardrail: FallbackValidator,
        judge: FallbackValidator,
        router: Arc<dyn Router>,
        specialists: SpecialistRegistry,
        memory: Arc<dyn SessionMemory>,
    ) -> Self {
        Self {
            guardrail,
            judge,
            router,
            specialists,
            memory,
        }
    }

    /// Run one query through the full pipeline. Total: always returns an
    /// outcome.
    pub async fn run(&self, request: PipelineRequest) -> PipelineOutcome {
        let session_id = request
            .session_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let history = self.memory.get(&session_id).await.unwrap_or_default();

        // Guardrail: an unavailable check fails open inside the validator
        let verdict = self
            .guardrail
            .validate(&ValidationInput::query(request.query.clone(), history.clone()))
            .await;
        if !verdict.valid {
            info!("guardrail rejected query");
            let answer = verdict
                .message
                .unwrap_or_else(|| REJECTION_ANSWER.to_string());
            let route = request.route_hint.unwrap_or(RouteTag::Assistant);
            self.record(&session_id, &request.query, &answer).await;
            return PipelineOutcome {
                answer,
                contexts: Vec::new(),
                route,
            };
        }

        // Route: hint wins; otherwise the cascade, which never fails
        let route = match request.route_hint {
            Some(route) => route,
            None => {
                let decision = self.router.route(&request.query, Some(&session_id)).await;
                debug!(route = %decision.route, reason = ?decision.reason, "routed");
                decision.route
            }
        };

        // Generate: specialist for the route, FAQ specialist as fallback,
        // fixed apology as the last resort
        let explicit_contexts = request.contexts.as_deref().map(normalize_contexts);
        let generated = match self
            .specialists
            .get(route)
            .answer(&request.query, Some(&session_id), explicit_contexts.as_deref())
            .await
        {
            Ok(answer) => answer,
            Err(error) => {
                warn!(%route, %error, "specialist failed; falling back to faq");
                match self
                    .specialists
                    .fallback()
                    .answer(&request.query, Some(&session_id), explicit_contexts.as_deref())
                    .await
                {
                    Ok(answer) => answer,
                    Err(error) => {
                        warn!(%error, "fallback specialist failed");
                        SpecialistAnswer::new(APOLOGY_ANSWER, Vec::new())
                    }
                }
            }
        };

        // Judge: an invalid verdict replaces the answer; errors fail open
        let verdict = self
            .judge
            .validate(&ValidationInput::answer(
                request.query.clone(),
                generated.text.clone(),
                generated.joined_context(),
                history,
            ))
            .await;

        let answer = match (verdict.valid, verdict.message) {
            (false, Some(message)) => {
                info!("judge replaced answer");
                message
            }
            _ => generated.text,
        };

        self.record(&session_id, &request.query, &answer).await;

        PipelineOutcome {
            answer,
            contexts: generated.contexts,
            route,
        }
    }

    /// Append the exchange to session memory; never fails the request
    async fn record(&self, session_id: &str, query: &str, answer: &str) {
        if let Err(error) = record_exchange(self.memory.as_ref(), session_id, query, answer).await
        {
            warn!(%error, "could not store exchange in session memory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::domain::retrieval::mock::MockRetriever;
    use crate::domain::retrieval::ScoredContext;
    use crate::domain::routing::RouteDecision;
    use crate::domain::validation::mock::{DomainErrorKind, MockValidationProvider};
    use crate::domain::validation::ValidationProvider;
    use crate::domain::generation::{GenerationProvider, MockGenerationProvider};
    use crate::infrastructure::memory::InMemorySessionMemory;
    use crate::infrastructure::specialists::{
        FaqSpecialist, RagSpecialist, Specialist, SpecialistProfile,
    };
    use async_trait::async_trait;

    #[derive(Debug)]
    struct FixedRouter(RouteTag);

    #[async_trait]
    impl Router for FixedRouter {
        async fn route(&self, _query: &str, _session: Option<&str>) -> RouteDecision {
            RouteDecision::new(self.0, "fixed")
        }
    }

    struct PipelineBuilder {
        guardrail: Vec<Arc<dyn ValidationProvider>>,
        judge: Vec<Arc<dyn ValidationProvider>>,
        retriever: MockRetriever,
        provider: Option<Arc<dyn GenerationProvider>>,
        route: RouteTag,
        memory: Arc<InMemorySessionMemory>,
    }

    impl PipelineBuilder {
        fn new() -> Self {
            Self {
                guardrail: Vec::new(),
                judge: Vec::new(),
                retriever: MockRetriever::new(),
                provider: None,
                route: RouteTag::Technical,
                memory: Arc::new(InMemorySessionMemory::new()),
            }
        }

        fn build(self) -> ChatPipeline {
            let retriever = Arc::new(self.retriever);
            let memory = self.memory.clone() as Arc<dyn SessionMemory>;
            let timeout = Duration::from_millis(200);

            let technical = Arc::new(RagSpecialist::new(
                SpecialistProfile::technical(),
                retriever.clone(),
                self.provider.clone(),
                memory.clone(),
                "answer-model",
                3,
                timeout,
            ));
            let faq = Arc::new(FaqSpecialist::new(
                retriever.clone(),
                self.provider.clone(),
                "faq-model",
                0.6,
                timeout,
            ));

            ChatPipeline::new(
                FallbackValidator::new(self.guardrail, timeout),
                FallbackValidator::new(self.judge, timeout),
                Arc::new(FixedRouter(self.route)),
                SpecialistRegistry::new(
                    vec![technical as Arc<dyn Specialist>, faq.clone()],
                    faq,
                ),
                memory,
            )
        }
    }

    fn pressure_retriever() -> MockRetriever {
        MockRetriever::new().with_results(vec![ScoredContext::new(
            0.8,
            "Pressure\nNormal range is 10 to 20 psi",
        )])
    }

    #[tokio::test]
    async fn test_degrades_to_snippet_without_provider() {
        let mut builder = PipelineBuilder::new();
        builder.retriever = pressure_retriever();
        let pipeline = builder.build();

        let outcome = pipeline
            .run(PipelineRequest::new("what is the normal pressure range"))
            .await;

        assert!(outcome.answer.contains("10 to 20 psi"));
        assert!(outcome.answer.chars().count() <= 1200);
        assert_eq!(outcome.route, RouteTag::Technical);
    }

    #[tokio::test]
    async fn test_guardrail_rejection_short_circuits() {
        let mut builder = PipelineBuilder::new();
        builder.guardrail = vec![Arc::new(MockValidationProvider::invalid(
            "guard",
            "I cannot help with that.",
        ))];
        builder.retriever = pressure_retriever();
        let pipeline = builder.build();

        let outcome = pipeline.run(PipelineRequest::new("something rude")).await;
        assert_eq!(outcome.answer, "I cannot help with that.");
        assert!(outcome.contexts.is_empty());
    }

    #[tokio::test]
    async fn test_guardrail_errors_fail_open() {
        let mut builder = PipelineBuilder::new();
        builder.guardrail = vec![Arc::new(MockValidationProvider::failing(
            "guard",
            DomainErrorKind::Provider,
        ))];
        builder.retriever = pressure_retriever();
        let pipeline = builder.build();

        let outcome = pipeline.run(PipelineRequest::new("pressure range?")).await;
        // The answer reflects the Generate stage, not a guardrail rejection
        assert!(outcome.answer.contains("10 to 20 psi"));
    }

    #[tokio::test]
    async fn test_judge_invalid_replaces_answer() {
        // Guardrail times out, judge rejects: final answer is the judge's
        let mut builder = PipelineBuilder::new();
        builder.guardrail = vec![Arc::new(MockValidationProvider::failing(
            "guard",
            DomainErrorKind::Timeout,
        ))];
        builder.judge = vec![Arc::new(MockValidationProvider::invalid(
            "judge",
            "out of scope",
        ))];
        builder.retriever = pressure_retriever();
        let pipeline = builder.build();

        let outcome = pipeline.run(PipelineRequest::new("pressure range?")).await;
        assert_eq!(outcome.answer, "out of scope");
    }

    #[tokio::test]
    async fn test_judge_error_fails_open() {
        let mut builder = PipelineBuilder::new();
        builder.judge = vec![Arc::new(MockValidationProvider::failing(
            "judge",
            DomainErrorKind::Provider,
        ))];
        builder.retriever = pressure_retriever();
        let pipeline = builder.build();

        let outcome = pipeline.run(PipelineRequest::new("pressure range?")).await;
        assert!(outcome.answer.contains("10 to 20 psi"));
    }

    #[tokio::test]
    async fn test_empty_corpus_still_responds() {
        let pipeline = PipelineBuilder::new().build();

        let outcome = pipeline.run(PipelineRequest::new("anything at all")).await;
        assert!(!outcome.answer.is_empty());
    }

    #[tokio::test]
    async fn test_route_hint_bypasses_router() {
        let mut builder = PipelineBuilder::new();
        // Router would say Technical; the hint forces FAQ
        builder.route = RouteTag::Technical;
        builder.retriever = pressure_retriever();
        let pipeline = builder.build();

        let outcome = pipeline
            .run(PipelineRequest::new("anything").with_route_hint(RouteTag::Faq))
            .await;
        assert_eq!(outcome.route, RouteTag::Faq);
    }

    #[tokio::test]
    async fn test_exchange_recorded_after_respond() {
        let mut builder = PipelineBuilder::new();
        builder.retriever = pressure_retriever();
        let memory = builder.memory.clone();
        let pipeline = builder.build();

        pipeline
            .run(PipelineRequest::new("pressure range?").with_session("s-1"))
            .await;

        let messages = memory.get("s-1").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "pressure range?");
        assert!(messages[1].content.contains("10 to 20 psi"));
    }

    #[tokio::test]
    async fn test_explicit_contexts_flow_to_specialist() {
        let provider = Arc::new(MockGenerationProvider::new().with_response("from context"));
        let mut builder = PipelineBuilder::new();
        builder.provider = Some(provider.clone());
        let pipeline = builder.build();

        let outcome = pipeline
            .run(
                PipelineRequest::new("q").with_contexts(vec![ContextSource::from(
                    "caller supplied context",
                )]),
            )
            .await;

        assert_eq!(outcome.answer, "from context");
        assert_eq!(outcome.contexts, vec!["caller supplied context"]);
    }
}
