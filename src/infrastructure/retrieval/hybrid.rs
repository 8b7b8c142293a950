//! Vector-similarity retrieval with a BM25 lexical fallback.
//!
//! The vector path is used when an embedding provider is configured and the
//! corpus has chunks; any failure along it degrades silently to the lexical
//! path. Retrieval never returns an error to its callers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::corpus::{token_set, tokenize, CorpusSnapshot};
use crate::domain::retrieval::{ContextRetriever, RetrievalConfig, ScoredContext};
use crate::domain::{DomainError, EmbeddingProvider};
use crate::infrastructure::corpus::CorpusStore;

/// Ranks corpus chunks against a query: cosine similarity over lazily
/// embedded chunks when possible, BM25 otherwise.
#[derive(Debug)]
pub struct HybridRetriever {
    store: Arc<CorpusStore>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    config: RetrievalConfig,
}

impl HybridRetriever {
    pub fn new(
        store: Arc<CorpusStore>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            config,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Scored retrieval; the single internal path both trait methods use.
    async fn rank(&self, query: &str, k: usize) -> Vec<ScoredContext> {
        let snapshot = match self.store.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(%error, "corpus unavailable; returning no context");
                return Vec::new();
            }
        };

        if snapshot.is_empty() || k == 0 {
            return Vec::new();
        }

        let k = self.config.effective_k(k, &token_set(query));

        if let Some(embedder) = &self.embedder {
            match self.rank_by_similarity(embedder, &snapshot, query, k).await {
                Ok(results) => return results,
                Err(error) => {
                    warn!(%error, "embedding retrieval failed; falling back to lexical ranking");
                }
            }
        }

        self.rank_by_bm25(&snapshot, query, k)
    }

    async fn rank_by_similarity(
        &self,
        embedder: &Arc<dyn EmbeddingProvider>,
        snapshot: &Arc<CorpusSnapshot>,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredContext>, DomainError> {
        let query_vector = embedder.embed(query).await?;

        let vectors = snapshot
            .chunk_vectors(|| embed_chunks(embedder.clone(), snapshot.clone()))
            .await?;

        let mut scored: Vec<(f32, usize)> = snapshot
            .chunks
            .iter()
            .zip(vectors.iter())
            .enumerate()
            .map(|(i, (_, vector))| (cosine_similarity(&query_vector, vector), i))
            .collect();

        // Stable sort keeps original chunk order on ties
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, i)| ScoredContext::new(score, snapshot.chunks[i].text.clone()))
            .collect())
    }

    fn rank_by_bm25(
        &self,
        snapshot: &Arc<CorpusSnapshot>,
        query: &str,
        k: usize,
    ) -> Vec<ScoredContext> {
        let query_tokens = tokenize(query);
        let scores = snapshot.index.bm25_scores(&query_tokens);

        let mut scored: Vec<(f32, usize)> =
            scores.into_iter().enumerate().map(|(i, s)| (s, i)).collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        debug!(k, candidates = scored.len(), "lexical ranking");

        scored
            .into_iter()
            .take(k)
            .map(|(score, i)| ScoredContext::new(score, snapshot.chunks[i].text.clone()))
            .collect()
    }
}

/// Embed every chunk of a snapshot, reusing an entry's precomputed vector
/// for its chunks when the corpus file shipped one.
async fn embed_chunks(
    embedder: Arc<dyn EmbeddingProvider>,
    snapshot: Arc<CorpusSnapshot>,
) -> Result<Vec<Vec<f32>>, DomainError> {
    let mut vectors = Vec::with_capacity(snapshot.chunks.len());

    for chunk in &snapshot.chunks {
        let precomputed = snapshot
            .entries
            .get(chunk.entry_index)
            .and_then(|entry| entry.embedding.clone());

        match precomputed {
            Some(vector) => vectors.push(vector),
            None => vectors.push(embedder.embed(&chunk.text).await?),
        }
    }

    Ok(vectors)
}

/// Normalized dot product; zero-norm vectors score 0 against anything
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    dot / (norm_a * norm_b)
}

#[async_trait]
impl ContextRetriever for HybridRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Vec<String> {
        self.rank(query, k)
            .await
            .into_iter()
            .map(|r| r.text)
            .collect()
    }

    async fn retrieve_scored(&self, query: &str, k: usize) -> Vec<ScoredContext> {
        self.rank(query, k).await
    }
}
