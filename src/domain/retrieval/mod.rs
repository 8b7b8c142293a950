//! Retrieval contract consumed by the router and the specialists

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// One retrieved context with its relevance score.
///
/// Lists of these are always ordered by non-increasing score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredContext {
    pub score: f32,
    pub text: String,
}

impl ScoredContext {
    pub fn new(score: f32, text: impl Into<String>) -> Self {
        Self {
            score,
            text: text.into(),
        }
    }
}

/// Tunables for retrieval and routing that were chosen empirically in
/// production; kept as named configuration rather than buried constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Default number of contexts returned to specialists
    pub top_k: usize,
    /// k is widened to at least this when the query touches the system vocabulary
    pub widened_k: usize,
    /// Top retrieval score at or above which the router picks the FAQ route
    pub faq_score_threshold: f32,
    /// Fraction of query tokens that must appear in a context for a direct match
    pub overlap_ratio: f32,
    /// Terms marking navigation/system-usage questions rather than domain content.
    /// Such queries are usually answered by one short specific chunk that may not
    /// top the ranking, so k is widened to keep it in the candidate set.
    pub system_vocabulary: Vec<String>,
}

impl RetrievalConfig {
    /// Whether any query token belongs to the system vocabulary
    pub fn touches_system_vocabulary(&self, query_tokens: &HashSet<String>) -> bool {
        self.system_vocabulary
            .iter()
            .any(|term| query_tokens.contains(term))
    }

    /// The k actually used: widened for system-vocabulary queries
    pub fn effective_k(&self, requested_k: usize, query_tokens: &HashSet<String>) -> usize {
        if self.touches_system_vocabulary(query_tokens) {
            requested_k.max(self.widened_k)
        } else {
            requested_k
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            widened_k: 8,
            faq_score_threshold: 0.65,
            overlap_ratio: 0.6,
            system_vocabulary: [
                "login", "access", "user", "profile", "page", "dashboard", "panel", "form",
                "notification", "app", "mobile", "web", "platform", "system", "account",
                "password", "timesheet", "clock", "signup", "register",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Ranked context lookup against the knowledge corpus.
///
/// Implementations never fail: any upstream problem degrades to a smaller or
/// empty result list.
#[async_trait]
pub trait ContextRetriever: Send + Sync + Debug {
    /// Up to `k` context texts, most relevant first
    async fn retrieve(&self, query: &str, k: usize) -> Vec<String>;

    /// Up to `k` contexts with scores, non-increasing
    async fn retrieve_scored(&self, query: &str, k: usize) -> Vec<ScoredContext>;
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::corpus::token_set;

    #[test]
    fn test_effective_k_widens_for_system_queries() {
        let config = RetrievalConfig::default();

        let tokens = token_set("how do I reset my login password");
        assert_eq!(config.effective_k(3, &tokens), 8);
        assert_eq!(config.effective_k(10, &tokens), 10);
    }

    #[test]
    fn test_effective_k_unchanged_for_domain_queries() {
        let config = RetrievalConfig::default();

        let tokens = token_set("chlorine residual after filtration");
        assert_eq!(config.effective_k(3, &tokens), 3);
    }
}
