//! Model-backed route classifier (third routing tier)

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::generation::{FewShot, GenerationProvider, GenerationRequest, Message};
use crate::domain::routing::{RouteClassifier, RouteDecision, RouteTag};
use crate::domain::DomainError;
use crate::infrastructure::generation::parse_json_object;

const CLASSIFIER_PROMPT: &str = "You are the router for a water treatment plant support \
assistant. Pick exactly ONE destination for the user message:\n\
- 'assistant': general usage questions, how-to, everyday help.\n\
- 'technical': plant operations, water chemistry, equipment, code, infrastructure, errors.\n\
- 'organizational': policies, processes, institutional and HR rules.\n\
Reply with a strict JSON object: {\"route\": \"assistant|technical|organizational\", \
\"reason\": \"<short reason>\"}. No other text.";

fn classifier_fewshots() -> Vec<FewShot> {
    vec![
        FewShot::new(
            "How do I use the form to report an incident?",
            r#"{"route":"assistant","reason":"usage question"}"#,
        ),
        FewShot::new(
            "What coagulant dose for raw water at 80 NTU?",
            r#"{"route":"technical","reason":"treatment process"}"#,
        ),
        FewShot::new(
            "What are the rules for requesting vacation?",
            r#"{"route":"organizational","reason":"institutional policy"}"#,
        ),
        FewShot::new(
            "The /chat endpoint returns error 500",
            r#"{"route":"technical","reason":"API error"}"#,
        ),
    ]
}

/// Structured model reply for a routing decision
#[derive(Debug, Deserialize)]
struct RouteReply {
    route: String,
    reason: Option<String>,
}

/// Asks a generative model to classify the query into one of the known
/// routes. An answer outside the known set is an error, which the cascade
/// treats as "no decision".
#[derive(Debug)]
pub struct ModelRouteClassifier {
    provider: Arc<dyn GenerationProvider>,
    model: String,
}

impl ModelRouteClassifier {
    pub fn new(provider: Arc<dyn GenerationProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[async_trait]
impl RouteClassifier for ModelRouteClassifier {
    async fn classify(
        &self,
        query: &str,
        history: &[Message],
    ) -> Result<RouteDecision, DomainError> {
        let request = GenerationRequest::new(query)
            .with_system_prompt(CLASSIFIER_PROMPT)
            .with_fewshots(classifier_fewshots())
            .with_history(history.to_vec())
            .with_json_output();

        let output = self.provider.generate(&self.model, request).await?;
        let reply: RouteReply = parse_json_object(&output)?;

        let route = RouteTag::parse(&reply.route)
            .ok_or_else(|| DomainError::validation(format!("unknown route '{}'", reply.route)))?;

        Ok(RouteDecision {
            route,
            reason: reply.reason,
        })
    }

    fn classifier_name(&self) -> &'static str {
        "model-router"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generation::MockGenerationProvider;

    #[tokio::test]
    async fn test_classifies_known_route() {
        let provider = Arc::new(
            MockGenerationProvider::new()
                .with_response(r#"{"route":"organizational","reason":"policy"}"#),
        );
        let classifier = ModelRouteClassifier::new(provider, "router-model");

        let decision = classifier
            .classify("what is the overtime policy", &[])
            .await
            .unwrap();
        assert_eq!(decision.route, RouteTag::Organizational);
        assert_eq!(decision.reason.as_deref(), Some("policy"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_an_error() {
        let provider =
            Arc::new(MockGenerationProvider::new().with_response(r#"{"route":"billing"}"#));
        let classifier = ModelRouteClassifier::new(provider, "router-model");

        let result = classifier.classify("some question", &[]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_request_carries_fewshots_and_json_flag() {
        let provider = Arc::new(
            MockGenerationProvider::new().with_response(r#"{"route":"assistant"}"#),
        );
        let classifier = ModelRouteClassifier::new(provider.clone(), "router-model");

        classifier.classify("hello", &[]).await.unwrap();

        let (_, request) = provider.requests().pop().unwrap();
        assert!(!request.fewshots.is_empty());
        assert!(request.json_output);
        assert!(request.system_prompt.contains("router"));
    }
}
