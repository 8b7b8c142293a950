//! Embedding capability contract

use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::DomainError;

/// Text-to-vector capability. Absence or failure of a provider is never an
/// error for callers of the retrieval engine; it triggers the lexical
/// fallback instead.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    /// Embed a batch of texts, one vector per input in order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Provider name for logs and error messages
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic embedder that counts calls, for cache and
    /// single-flight tests.
    #[derive(Debug, Default)]
    pub struct MockEmbeddingProvider {
        calls: AtomicUsize,
        error: Option<String>,
    }

    impl MockEmbeddingProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        /// Number of `embed` invocations so far
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbeddingProvider {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(ref error) = self.error {
                return Err(DomainError::provider("mock-embed", error));
            }

            // Hash the text into a small deterministic vector
            let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_add(b as u64));
            Ok((0..8)
                .map(|i| ((hash.wrapping_add(i) % 1000) as f32 / 1000.0) - 0.5)
                .collect())
        }

        fn provider_name(&self) -> &'static str {
            "mock-embed"
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_is_deterministic() {
            let provider = MockEmbeddingProvider::new();
            let a = provider.embed("pressure").await.unwrap();
            let b = provider.embed("pressure").await.unwrap();
            assert_eq!(a, b);
            assert_eq!(provider.call_count(), 2);
        }

        #[tokio::test]
        async fn test_mock_error() {
            let provider = MockEmbeddingProvider::new().with_error("down");
            assert!(provider.embed("x").await.is_err());
        }

        #[tokio::test]
        async fn test_batch_default_impl_preserves_order() {
            let provider = MockEmbeddingProvider::new();
            let texts = vec!["a".to_string(), "b".to_string()];
            let batch = provider.embed_batch(&texts).await.unwrap();

            assert_eq!(batch.len(), 2);
            assert_eq!(batch[0], provider.embed("a").await.unwrap());
        }
    }
}
