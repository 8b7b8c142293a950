//! OpenAI-compatible chat-completions provider.
//!
//! The default concrete binding for the generation capability; any endpoint
//! speaking the same wire format works through `base_url`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::http_client::HttpClientTrait;
use crate::domain::generation::{GenerationProvider, GenerationRequest, MessageRole};
use crate::domain::DomainError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Chat provider speaking the OpenAI `/v1/chat/completions` wire format
#[derive(Debug)]
pub struct OpenAiGenerationProvider {
    client: Arc<dyn HttpClientTrait>,
    auth_header: String,
    base_url: String,
}

impl OpenAiGenerationProvider {
    pub fn new(client: Arc<dyn HttpClientTrait>, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        client: Arc<dyn HttpClientTrait>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            auth_header: format!("Bearer {}", api_key.into()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn build_body(model: &str, request: GenerationRequest) -> serde_json::Value {
        let temperature = request.temperature;
        let json_output = request.json_output;

        let messages: Vec<serde_json::Value> = request
            .into_messages()
            .into_iter()
            .map(|m| {
                serde_json::json!({
                    "role": role_name(m.role),
                    "content": m.content,
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
        });

        if let Some(temperature) = temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        if json_output {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }

        body
    }
}

fn role_name(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl GenerationProvider for OpenAiGenerationProvider {
    async fn generate(
        &self,
        model: &str,
        request: GenerationRequest,
    ) -> Result<String, DomainError> {
        let body = Self::build_body(model, request);
        let headers = vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ];

        let json = self
            .client
            .post_json(&self.completions_url(), headers, &body)
            .await?;

        let response: ChatResponse = serde_json::from_value(json)
            .map_err(|e| DomainError::provider("openai", format!("cannot parse response: {e}")))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DomainError::provider("openai", "no choices in response"))?;

        Ok(content)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::generation::HttpClient;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenAiGenerationProvider {
        let client = HttpClient::new(std::time::Duration::from_secs(5)).unwrap();
        OpenAiGenerationProvider::with_base_url(Arc::new(client), "test-key", server.uri())
    }

    #[test]
    fn test_build_body_includes_options() {
        let request = GenerationRequest::new("q")
            .with_system_prompt("sys")
            .with_temperature(0.3)
            .with_json_output();
        let body = OpenAiGenerationProvider::build_body("m1", request);

        assert_eq!(body["model"], "m1");
        assert_eq!(body["temperature"], 0.3);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
    }

    #[tokio::test]
    async fn test_generate_parses_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({"model": "answer-model"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "the answer"}}]
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let answer = provider
            .generate("answer-model", GenerationRequest::new("question"))
            .await
            .unwrap();

        assert_eq!(answer, "the answer");
    }

    #[tokio::test]
    async fn test_http_error_maps_to_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let result = provider
            .generate("answer-model", GenerationRequest::new("question"))
            .await;

        let error = result.unwrap_err();
        assert!(error.is_unavailable());
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let result = provider
            .generate("answer-model", GenerationRequest::new("question"))
            .await;
        assert!(result.is_err());
    }
}
