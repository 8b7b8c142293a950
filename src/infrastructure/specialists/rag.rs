//! Retrieval-augmented specialists for the assistant, technical and
//! organizational routes

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{truncate_chars, Specialist, SpecialistAnswer, MAX_SNIPPET_LEN};
use crate::domain::generation::{FewShot, GenerationProvider, GenerationRequest};
use crate::domain::retrieval::ContextRetriever;
use crate::domain::routing::RouteTag;
use crate::domain::{DomainError, SessionMemory};

const NO_CONTEXT_ANSWER: &str =
    "I could not find enough information in the knowledge base to answer that.";

const ASSISTANT_PROMPT: &str = "You are the general support assistant for a water treatment \
plant platform. Answer using only the provided context. Be direct and practical; when the \
context does not cover the question, say so plainly.";

const TECHNICAL_PROMPT: &str = "You are the technical specialist for water treatment plant \
operations. Answer operational and engineering questions using only the provided context. \
Give concrete values and procedures when the context has them; never invent figures.";

const ORGANIZATIONAL_PROMPT: &str = "You are the organizational specialist for a water \
treatment company. Answer questions about policies, processes and institutional rules using \
only the provided context. Quote the applicable rule when possible.";

/// Static parameterization of one retrieval-augmented specialist
#[derive(Debug, Clone)]
pub struct SpecialistProfile {
    pub route: RouteTag,
    pub system_prompt: &'static str,
    pub fewshots: Vec<FewShot>,
    pub temperature: f32,
}

impl SpecialistProfile {
    pub fn assistant() -> Self {
        Self {
            route: RouteTag::Assistant,
            system_prompt: ASSISTANT_PROMPT,
            fewshots: vec![FewShot::new(
                "How do I report a pump failure?",
                "Open the incident form from the dashboard, pick the asset and describe the \
                 failure; maintenance is notified automatically.",
            )],
            temperature: 0.3,
        }
    }

    pub fn technical() -> Self {
        Self {
            route: RouteTag::Technical,
            system_prompt: TECHNICAL_PROMPT,
            fewshots: vec![FewShot::new(
                "What is the target free chlorine residual?",
                "Keep free chlorine between 0.2 and 0.5 mg/L at the contact tank outlet, per \
                 the plant's dosing table.",
            )],
            temperature: 0.3,
        }
    }

    pub fn organizational() -> Self {
        Self {
            route: RouteTag::Organizational,
            system_prompt: ORGANIZATIONAL_PROMPT,
            fewshots: vec![FewShot::new(
                "How far ahead must I request vacation?",
                "Vacation requests go through the manager thirty days ahead, per the leave \
                 policy.",
            )],
            temperature: 0.1,
        }
    }
}

/// Retrieve-then-generate specialist. With no generation provider - or a
/// failing one - it degrades to the best retrieved chunk instead of an
/// error message, as long as any context exists.
#[derive(Debug)]
pub struct RagSpecialist {
    profile: SpecialistProfile,
    retriever: Arc<dyn ContextRetriever>,
    provider: Option<Arc<dyn GenerationProvider>>,
    memory: Arc<dyn SessionMemory>,
    model: String,
    top_k: usize,
    timeout: Duration,
}

impl RagSpecialist {
    pub fn new(
        profile: SpecialistProfile,
        retriever: Arc<dyn ContextRetriever>,
        provider: Option<Arc<dyn GenerationProvider>>,
        memory: Arc<dyn SessionMemory>,
        model: impl Into<String>,
        top_k: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            profile,
            retriever,
            provider,
            memory,
            model: model.into(),
            top_k,
            timeout,
        }
    }

    /// Best retrieved chunk, truncated; the stage's deterministic fallback
    fn snippet_answer(context_texts: &[String]) -> SpecialistAnswer {
        match context_texts.first() {
            Some(best) => SpecialistAnswer::new(
                truncate_chars(best.trim(), MAX_SNIPPET_LEN),
                context_texts.to_vec(),
            ),
            None => SpecialistAnswer::new(NO_CONTEXT_ANSWER, Vec::new()),
        }
    }
}

#[async_trait]
impl Specialist for RagSpecialist {
    async fn answer(
        &self,
        query: &str,
        session_id: Option<&str>,
        contexts: Option<&[String]>,
    ) -> Result<SpecialistAnswer, DomainError> {
        let context_texts: Vec<String> = match contexts {
            Some(texts) if !texts.is_empty() => texts.to_vec(),
            _ => self.retriever.retrieve(query, self.top_k).await,
        };
        let context = context_texts.join("\n");

        let Some(provider) = &self.provider else {
            return Ok(Self::snippet_answer(&context_texts));
        };

        let history = match session_id {
            Some(id) => self.memory.get(id).await.unwrap_or_default(),
            None => Vec::new(),
        };

        let request = GenerationRequest::new(query)
            .with_system_prompt(self.profile.system_prompt)
            .with_fewshots(self.profile.fewshots.clone())
            .with_history(history)
            .with_context(context)
            .with_temperature(self.profile.temperature);

        let outcome =
            tokio::time::timeout(self.timeout, provider.generate(&self.model, request)).await;

        match outcome {
            Ok(Ok(text)) => Ok(SpecialistAnswer::new(text, context_texts)),
            Ok(Err(error)) => {
                warn!(route = %self.profile.route, %error, "generation failed; using snippet");
                Ok(Self::snippet_answer(&context_texts))
            }
            Err(_) => {
                warn!(route = %self.profile.route, "generation timed out; using snippet");
                Ok(Self::snippet_answer(&context_texts))
            }
        }
    }

    fn route(&self) -> RouteTag {
        self.profile.route
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generation::MockGenerationProvider;
    use crate::domain::retrieval::mock::MockRetriever;
    use crate::domain::retrieval::ScoredContext;
    use crate::infrastructure::memory::InMemorySessionMemory;

    fn specialist(
        retriever: MockRetriever,
        provider: Option<Arc<dyn GenerationProvider>>,
    ) -> RagSpecialist {
        RagSpecialist::new(
            SpecialistProfile::technical(),
            Arc::new(retriever),
            provider,
            Arc::new(InMemorySessionMemory::new()),
            "answer-model",
            3,
            Duration::from_millis(200),
        )
    }

    fn retriever_with(texts: &[&str]) -> MockRetriever {
        MockRetriever::new().with_results(
            texts
                .iter()
                .enumerate()
                .map(|(i, t)| ScoredContext::new(1.0 - i as f32 * 0.1, *t))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_generates_with_retrieved_context() {
        let provider = Arc::new(MockGenerationProvider::new().with_response("Dose 12 mg/L."));
        let specialist = specialist(
            retriever_with(&["dosing table entry", "unrelated"]),
            Some(provider.clone()),
        );

        let answer = specialist.answer("coagulant dose?", None, None).await.unwrap();
        assert_eq!(answer.text, "Dose 12 mg/L.");
        assert!(answer.joined_context().contains("dosing table entry"));

        let (_, request) = provider.requests().pop().unwrap();
        assert!(request.context.contains("dosing table entry"));
    }

    #[tokio::test]
    async fn test_no_provider_degrades_to_snippet() {
        let long_chunk = "psi ".repeat(500);
        let specialist = specialist(retriever_with(&[&long_chunk]), None);

        let answer = specialist.answer("pressure?", None, None).await.unwrap();
        assert!(answer.text.chars().count() <= MAX_SNIPPET_LEN);
        assert!(answer.text.starts_with("psi"));
    }

    #[tokio::test]
    async fn test_provider_error_degrades_to_snippet() {
        let provider: Arc<dyn GenerationProvider> =
            Arc::new(MockGenerationProvider::new().with_error("rate limited"));
        let specialist = specialist(retriever_with(&["the best chunk"]), Some(provider));

        let answer = specialist.answer("anything", None, None).await.unwrap();
        assert_eq!(answer.text, "the best chunk");
    }

    #[tokio::test]
    async fn test_no_context_yields_fixed_answer() {
        let specialist = specialist(MockRetriever::new(), None);

        let answer = specialist.answer("anything", None, None).await.unwrap();
        assert_eq!(answer.text, NO_CONTEXT_ANSWER);
        assert!(answer.contexts.is_empty());
    }

    #[tokio::test]
    async fn test_explicit_contexts_bypass_retrieval() {
        let provider = Arc::new(MockGenerationProvider::new().with_response("ok"));
        // Retriever would return something else entirely
        let specialist = specialist(retriever_with(&["retrieved"]), Some(provider.clone()));

        let explicit = vec!["caller context".to_string()];
        let answer = specialist
            .answer("q", None, Some(&explicit))
            .await
            .unwrap();

        assert_eq!(answer.contexts, explicit);
        let (_, request) = provider.requests().pop().unwrap();
        assert_eq!(request.context, "caller context");
    }
}
