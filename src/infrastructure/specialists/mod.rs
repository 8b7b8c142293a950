//! Domain specialists: the Generate stage of the pipeline

mod faq;
mod rag;

pub use faq::FaqSpecialist;
pub use rag::{RagSpecialist, SpecialistProfile};

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::routing::RouteTag;
use crate::domain::DomainError;

/// Longest deterministic-fallback answer, in characters
pub const MAX_SNIPPET_LEN: usize = 1200;

/// A specialist's answer together with the contexts it was grounded on
#[derive(Debug, Clone)]
pub struct SpecialistAnswer {
    pub text: String,
    pub contexts: Vec<String>,
}

impl SpecialistAnswer {
    pub fn new(text: impl Into<String>, contexts: Vec<String>) -> Self {
        Self {
            text: text.into(),
            contexts,
        }
    }

    /// The contexts as one block, the way validators consume them
    pub fn joined_context(&self) -> String {
        self.contexts.join("\n")
    }
}

/// A domain-specific answer generator. Retrieves its own context unless the
/// caller supplied an explicit list.
#[async_trait]
pub trait Specialist: Send + Sync + Debug {
    async fn answer(
        &self,
        query: &str,
        session_id: Option<&str>,
        contexts: Option<&[String]>,
    ) -> Result<SpecialistAnswer, DomainError>;

    fn route(&self) -> RouteTag;
}

/// Route-to-specialist binding with the FAQ specialist as the failure
/// fallback for the Generate stage.
#[derive(Debug)]
pub struct SpecialistRegistry {
    specialists: HashMap<RouteTag, Arc<dyn Specialist>>,
    fallback: Arc<dyn Specialist>,
}

impl SpecialistRegistry {
    pub fn new(specialists: Vec<Arc<dyn Specialist>>, fallback: Arc<dyn Specialist>) -> Self {
        let specialists = specialists
            .into_iter()
            .map(|s| (s.route(), s))
            .collect();
        Self {
            specialists,
            fallback,
        }
    }

    /// The specialist for a route; unknown routes get the fallback
    pub fn get(&self, route: RouteTag) -> Arc<dyn Specialist> {
        self.specialists
            .get(&route)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    pub fn fallback(&self) -> Arc<dyn Specialist> {
        self.fallback.clone()
    }
}

/// Truncate on a character boundary
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
