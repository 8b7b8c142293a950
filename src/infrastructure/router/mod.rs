//! Four-tier routing cascade: keywords, retrieval confidence, classifier,
//! static default.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::domain::corpus::token_set;
use crate::domain::retrieval::ContextRetriever;
use crate::domain::routing::{RouteClassifier, RouteDecision, RouteTag, Router};
use crate::domain::{RetrievalConfig, SessionMemory};

/// Marker terms for plant-operations content
static TECHNICAL_MARKERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // engineering/infrastructure vocabulary
        "stack", "api", "endpoint", "error", "traceback", "docker", "kubernetes", "deploy",
        "embedding", "bug", "code",
        // treatment-process vocabulary
        "ph", "turbidity", "ntu", "alkalinity", "chlorination", "chlorine", "dosing", "dose",
        "coagulation", "flocculation", "sedimentation", "filtration", "backwash", "coagulant",
        "polymer", "hypochlorite", "sludge", "intake",
    ]
    .into_iter()
    .collect()
});

/// Marker terms for policy and institutional questions
static ORGANIZATIONAL_MARKERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "policy", "process", "rule", "procedure", "vacation", "vacations", "onboarding",
        "enrollment", "documentation", "institutional", "compliance", "audit",
    ]
    .into_iter()
    .collect()
});

/// Marker terms for system-usage questions, routed straight to the FAQ
static SYSTEM_MARKERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "page", "profile", "login", "access", "dashboard", "form", "notification", "alert",
        "signup", "register", "permission", "user", "app", "mobile", "web", "platform", "system",
        "account", "password",
    ]
    .into_iter()
    .collect()
});

/// Keyword tiers in precedence order
fn keyword_tiers() -> [(&'static HashSet<&'static str>, RouteTag, &'static str); 3] {
    [
        (&*TECHNICAL_MARKERS, RouteTag::Technical, "technical terms"),
        (
            &*ORGANIZATIONAL_MARKERS,
            RouteTag::Organizational,
            "organizational terms",
        ),
        (&*SYSTEM_MARKERS, RouteTag::Faq, "system-usage terms"),
    ]
}

/// Decides which specialist answers a query.
///
/// Tiers run in order and each one is attempted only if the previous
/// produced no decision; a tier that fails or times out is skipped. The
/// cascade always resolves - no error ever reaches the caller.
#[derive(Debug)]
pub struct CascadeRouter {
    retriever: Arc<dyn ContextRetriever>,
    classifier: Option<Arc<dyn RouteClassifier>>,
    memory: Arc<dyn SessionMemory>,
    config: RetrievalConfig,
    classifier_timeout: Duration,
}

impl CascadeRouter {
    pub fn new(
        retriever: Arc<dyn ContextRetriever>,
        classifier: Option<Arc<dyn RouteClassifier>>,
        memory: Arc<dyn SessionMemory>,
        config: RetrievalConfig,
        classifier_timeout: Duration,
    ) -> Self {
        Self {
            retriever,
            classifier,
            memory,
            config,
            classifier_timeout,
        }
    }

    fn keyword_tier(&self, query_tokens: &HashSet<String>) -> Option<RouteDecision> {
        for (markers, route, label) in keyword_tiers() {
            if query_tokens.iter().any(|token| markers.contains(token.as_str())) {
                return Some(RouteDecision::new(route, format!("keyword match: {label}")));
            }
        }
        None
    }

    async fn confidence_tier(&self, query: &str) -> Option<RouteDecision> {
        let results = self.retriever.retrieve_scored(query, 3).await;
        let top_score = results.first().map(|r| r.score)?;

        if top_score >= self.config.faq_score_threshold {
            return Some(RouteDecision::new(
                RouteTag::Faq,
                format!("faq match score={top_score:.2}"),
            ));
        }
        None
    }

    async fn classifier_tier(&self, query: &str, session_id: Option<&str>) -> Option<RouteDecision> {
        let classifier = self.classifier.as_ref()?;

        let history = match session_id {
            Some(id) => self.memory.get(id).await.unwrap_or_default(),
            None => Vec::new(),
        };

        let outcome = tokio::time::timeout(
            self.classifier_timeout,
            classifier.classify(query, &history),
        )
        .await;

        match outcome {
            Ok(Ok(decision)) => Some(decision),
            Ok(Err(error)) => {
                warn!(%error, "route classifier failed; trying next tier");
                None
            }
            Err(_) => {
                warn!("route classifier timed out; trying next tier");
                None
            }
        }
    }
}

#[async_trait]
impl Router for CascadeRouter {
    async fn route(&self, query: &str, session_id: Option<&str>) -> RouteDecision {
        let query = query.trim();
        if query.is_empty() {
            return RouteDecision::new(RouteTag::Assistant, "empty query");
        }

        let query_tokens = token_set(query);

        if let Some(decision) = self.keyword_tier(&query_tokens) {
            debug!(route = %decision.route, "keyword tier decided");
            return decision;
        }

        if let Some(decision) = self.confidence_tier(query).await {
            debug!(route = %decision.route, "confidence tier decided");
            return decision;
        }

        if let Some(decision) = self.classifier_tier(query, session_id).await {
            debug!(route = %decision.route, "classifier tier decided");
            return decision;
        }

        RouteDecision::new(RouteTag::Assistant, "default route")
    }
}
