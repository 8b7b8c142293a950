//! OpenAI-compatible embeddings provider

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::embedding::EmbeddingProvider;
use crate::domain::DomainError;
use crate::infrastructure::generation::HttpClientTrait;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Embeddings via the OpenAI `/v1/embeddings` wire format
#[derive(Debug)]
pub struct OpenAiEmbeddingProvider {
    client: Arc<dyn HttpClientTrait>,
    auth_header: String,
    base_url: String,
    model: String,
}

impl OpenAiEmbeddingProvider {
    pub fn new(
        client: Arc<dyn HttpClientTrait>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self::with_base_url(client, api_key, model, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        client: Arc<dyn HttpClientTrait>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            auth_header: format!("Bearer {}", api_key.into()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    fn embeddings_url(&self) -> String {
        format!("{}/v1/embeddings", self.base_url)
    }

    async fn request(&self, input: serde_json::Value) -> Result<Vec<Vec<f32>>, DomainError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": input,
        });
        let headers = vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ];

        let json = self
            .client
            .post_json(&self.embeddings_url(), headers, &body)
            .await?;

        let response: EmbeddingsResponse = serde_json::from_value(json)
            .map_err(|e| DomainError::provider("openai", format!("cannot parse response: {e}")))?;

        let mut rows = response.data;
        rows.sort_by_key(|row| row.index);
        Ok(rows.into_iter().map(|row| row.embedding).collect())
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let mut vectors = self.request(serde_json::json!(text)).await?;
        vectors
            .pop()
            .ok_or_else(|| DomainError::provider("openai", "no embedding in response"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(serde_json::json!(texts)).await
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
