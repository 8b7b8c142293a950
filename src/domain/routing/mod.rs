//! Route tags and the routing contracts

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::generation::Message;
use crate::domain::DomainError;

/// The domain specialist a query is sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteTag {
    /// General-purpose usage questions; the default
    Assistant,
    /// Plant operations and engineering content
    Technical,
    /// Policies, processes, institutional rules
    Organizational,
    /// System-usage questions answered straight from the FAQ corpus
    Faq,
}

impl RouteTag {
    pub const ALL: [RouteTag; 4] = [
        RouteTag::Assistant,
        RouteTag::Technical,
        RouteTag::Organizational,
        RouteTag::Faq,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assistant => "assistant",
            Self::Technical => "technical",
            Self::Organizational => "organizational",
            Self::Faq => "faq",
        }
    }

    /// Parse a route name; unknown names are rejected so a misbehaving
    /// classifier can never introduce a route the registry does not know.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "assistant" => Some(Self::Assistant),
            "technical" => Some(Self::Technical),
            "organizational" => Some(Self::Organizational),
            "faq" => Some(Self::Faq),
            _ => None,
        }
    }
}

impl std::fmt::Display for RouteTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A routing decision with an optional human-readable reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDecision {
    pub route: RouteTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RouteDecision {
    pub fn new(route: RouteTag, reason: impl Into<String>) -> Self {
        Self {
            route,
            reason: Some(reason.into()),
        }
    }
}

/// Query-to-specialist routing. Implementations never propagate an error;
/// every failure path resolves to some route.
#[async_trait]
pub trait Router: Send + Sync + Debug {
    async fn route(&self, query: &str, session_id: Option<&str>) -> RouteDecision;
}

/// External structured classifier used as one tier of the routing cascade
#[async_trait]
pub trait RouteClassifier: Send + Sync + Debug {
    /// Classify the query, optionally informed by recent history
    async fn classify(
        &self,
        query: &str,
        history: &[Message],
    ) -> Result<RouteDecision, DomainError>;

    fn classifier_name(&self) -> &'static str;
}
