//! FAQ specialist: system-usage answers straight from the corpus

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{truncate_chars, Specialist, SpecialistAnswer, MAX_SNIPPET_LEN};
use crate::domain::corpus::normalize;
use crate::domain::generation::{GenerationProvider, GenerationRequest};
use crate::domain::retrieval::ContextRetriever;
use crate::domain::routing::RouteTag;
use crate::domain::DomainError;

/// Contexts pulled for an FAQ answer when the caller supplied none
const FAQ_CONTEXT_K: usize = 6;

const NOT_FOUND_ANSWER: &str =
    "I could not find specific information about that in the system.";

const FAQ_PROMPT: &str = "You explain the features of the plant support platform. Use ONLY \
the provided context. When the context covers the question, answer directly with its \
specifics; when it does not, reply exactly: \"I could not find specific information about \
that in the system.\" Do not mention the context itself and do not add information beyond it.";

/// Answers system-usage questions. Prefers a direct textual match from the
/// context over a model call; degrades to a context snippet when no
/// generation provider is available.
#[derive(Debug)]
pub struct FaqSpecialist {
    retriever: Arc<dyn ContextRetriever>,
    provider: Option<Arc<dyn GenerationProvider>>,
    model: String,
    /// Fraction of query tokens that must appear in a context to count as
    /// a direct match
    overlap_ratio: f32,
    timeout: Duration,
}

impl FaqSpecialist {
    pub fn new(
        retriever: Arc<dyn ContextRetriever>,
        provider: Option<Arc<dyn GenerationProvider>>,
        model: impl Into<String>,
        overlap_ratio: f32,
        timeout: Duration,
    ) -> Self {
        Self {
            retriever,
            provider,
            model: model.into(),
            overlap_ratio,
            timeout,
        }
    }

    /// Score contexts by query-token hits; the first line (usually the
    /// title) weighs more than the body.
    fn best_context(contexts: &[String], query: &str) -> Option<String> {
        let query_terms: Vec<String> = normalize(query)
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let mut best_score = 0usize;
        let mut best = contexts.first()?.clone();

        for context in contexts {
            let normalized = normalize(context);
            let title = context.lines().next().unwrap_or_default().to_lowercase();

            let mut score = 0usize;
            for term in &query_terms {
                if normalized.contains(term.as_str()) {
                    score += 2;
                }
                if title.contains(term.as_str()) {
                    score += 3;
                }
            }

            if score > best_score {
                best_score = score;
                best = context.clone();
            }
        }

        Some(best)
    }

    /// A context's body when the query matches it strongly enough to answer
    /// without the model: the full normalized query is contained in the
    /// context, or at least `overlap_ratio` of its tokens are.
    fn direct_match(&self, contexts: &[String], query: &str) -> Option<String> {
        let normalized_query = normalize(query).trim().to_string();
        if normalized_query.is_empty() {
            return None;
        }

        let tokens: Vec<&str> = normalized_query
            .split_whitespace()
            .filter(|t| t.len() > 2)
            .collect();

        for context in contexts {
            let text = normalize(context);

            if text.contains(&normalized_query) {
                return Some(Self::context_body(context));
            }

            if !tokens.is_empty() {
                let hits = tokens.iter().filter(|t| text.contains(**t)).count();
                let needed =
                    usize::max(1, (tokens.len() as f32 * self.overlap_ratio) as usize);
                if hits >= needed {
                    return Some(Self::context_body(context));
                }
            }
        }

        None
    }

    /// The content part of a title/section/content context; the whole
    /// context when it has no such structure.
    fn context_body(context: &str) -> String {
        let lines: Vec<&str> = context.lines().collect();
        if lines.len() >= 3 {
            lines[2..].join("\n").trim().to_string()
        } else {
            context.trim().to_string()
        }
    }
}

#[async_trait]
impl Specialist for FaqSpecialist {
    async fn answer(
        &self,
        query: &str,
        _session_id: Option<&str>,
        contexts: Option<&[String]>,
    ) -> Result<SpecialistAnswer, DomainError> {
        let explicit = contexts.filter(|c| !c.is_empty());

        let (context, used) = match explicit {
            Some(texts) => {
                let best = Self::best_context(texts, query).unwrap_or_default();
                (best.clone(), vec![best])
            }
            None => {
                let scored = self.retriever.retrieve_scored(query, FAQ_CONTEXT_K).await;
                let texts: Vec<String> = scored.into_iter().map(|s| s.text).collect();
                (texts.join("\n\n---\n\n"), texts)
            }
        };

        if context.trim().is_empty() {
            return Ok(SpecialistAnswer::new(NOT_FOUND_ANSWER, Vec::new()));
        }

        // Strong textual match answers without a model call
        if let Some(texts) = explicit {
            if let Some(direct) = self.direct_match(texts, query) {
                debug!("faq direct match");
                return Ok(SpecialistAnswer::new(direct, used));
            }
        }

        let Some(provider) = &self.provider else {
            return Ok(SpecialistAnswer::new(
                truncate_chars(context.trim(), MAX_SNIPPET_LEN),
                used,
            ));
        };

        let request = GenerationRequest::new(query)
            .with_system_prompt(FAQ_PROMPT)
            .with_context(context.clone())
            .with_temperature(0.1);

        let outcome =
            tokio::time::timeout(self.timeout, provider.generate(&self.model, request)).await;

        match outcome {
            Ok(Ok(text)) => Ok(SpecialistAnswer::new(text.trim().to_string(), used)),
            Ok(Err(error)) => {
                warn!(%error, "faq generation failed; using context snippet");
                Ok(SpecialistAnswer::new(
                    truncate_chars(context.trim(), MAX_SNIPPET_LEN),
                    used,
                ))
            }
            Err(_) => {
                warn!("faq generation timed out; using context snippet");
                Ok(SpecialistAnswer::new(
                    truncate_chars(context.trim(), MAX_SNIPPET_LEN),
                    used,
                ))
            }
        }
    }

    fn route(&self) -> RouteTag {
        RouteTag::Faq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generation::MockGenerationProvider;
    use crate::domain::retrieval::mock::MockRetriever;
    use crate::domain::retrieval::ScoredContext;

    fn faq(
        retriever: MockRetriever,
        provider: Option<Arc<dyn GenerationProvider>>,
    ) -> FaqSpecialist {
        FaqSpecialist::new(
            Arc::new(retriever),
            provider,
            "faq-model",
            0.6,
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn test_direct_match_bypasses_model() {
        // Provider would answer differently; the direct match wins
        let provider: Arc<dyn GenerationProvider> =
            Arc::new(MockGenerationProvider::new().with_response("model answer"));
        let specialist = faq(MockRetriever::new(), Some(provider));

        let contexts = vec![
            "Clock in\nTimesheet\nOpen the app and press the clock in button".to_string(),
        ];
        let answer = specialist
            .answer("how do I clock in", None, Some(&contexts))
            .await
            .unwrap();

        assert_eq!(answer.text, "Open the app and press the clock in button");
    }

    #[tokio::test]
    async fn test_weak_overlap_goes_to_model() {
        let provider = Arc::new(MockGenerationProvider::new().with_response("model answer"));
        let specialist = faq(MockRetriever::new(), Some(provider.clone()));

        let contexts = vec!["Notifications\nAlerts\nAlerts appear on the dashboard".to_string()];
        let answer = specialist
            .answer("where do I change my avatar picture", None, Some(&contexts))
            .await
            .unwrap();

        assert_eq!(answer.text, "model answer");
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_retrieves_when_no_contexts_given() {
        let retriever = MockRetriever::new().with_results(vec![
            ScoredContext::new(0.9, "Login\nAccess\nUse your employee id"),
            ScoredContext::new(0.5, "Other topic"),
        ]);
        let specialist = faq(retriever, None);

        let answer = specialist.answer("how to login", None, None).await.unwrap();
        assert!(answer.text.contains("employee id"));
        assert_eq!(answer.contexts.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_everything_yields_not_found() {
        let specialist = faq(MockRetriever::new(), None);

        let answer = specialist.answer("anything", None, None).await.unwrap();
        assert_eq!(answer.text, NOT_FOUND_ANSWER);
    }

    #[tokio::test]
    async fn test_no_provider_returns_truncated_snippet() {
        let long = format!("Title\nSection\n{}", "x".repeat(5000));
        let retriever = MockRetriever::new().with_results(vec![ScoredContext::new(0.8, long)]);
        let specialist = faq(retriever, None);

        let answer = specialist.answer("anything at all", None, None).await.unwrap();
        assert!(answer.text.chars().count() <= MAX_SNIPPET_LEN);
    }

    #[tokio::test]
    async fn test_best_context_prefers_title_hits() {
        let contexts = vec![
            "Dashboard\nOverview\nThe dashboard shows alerts".to_string(),
            "Profile\nSettings\nDashboard note buried in body".to_string(),
        ];
        let best = FaqSpecialist::best_context(&contexts, "dashboard").unwrap();
        assert!(best.starts_with("Dashboard"));
    }
}
