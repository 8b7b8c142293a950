//! Validity-check capability used at pipeline entry (guardrail) and exit (judge)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::generation::Message;
use crate::domain::DomainError;

/// Result of a validity check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub valid: bool,
    /// A user-facing message when invalid; backends may omit it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Verdict {
    pub fn valid() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// What is being validated. The guardrail sees the raw query; the judge sees
/// the generated answer together with the context it was grounded on.
#[derive(Debug, Clone)]
pub enum ValidationInput {
    Query {
        query: String,
        history: Vec<Message>,
    },
    Answer {
        query: String,
        answer: String,
        context: String,
        history: Vec<Message>,
    },
}

impl ValidationInput {
    pub fn query(query: impl Into<String>, history: Vec<Message>) -> Self {
        Self::Query {
            query: query.into(),
            history,
        }
    }

    pub fn answer(
        query: impl Into<String>,
        answer: impl Into<String>,
        context: impl Into<String>,
        history: Vec<Message>,
    ) -> Self {
        Self::Answer {
            query: query.into(),
            answer: answer.into(),
            context: context.into(),
            history,
        }
    }
}

/// Opaque boolean-validity capability. The mechanism behind it (rules,
/// classifier, model) is interchangeable; consumers only see the verdict.
#[async_trait]
pub trait ValidationProvider: Send + Sync + Debug {
    async fn validate(&self, input: &ValidationInput) -> Result<Verdict, DomainError>;

    /// Backend name for logs and error messages
    fn provider_name(&self) -> &'static str;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_constructors() {
        assert!(Verdict::valid().valid);
        assert!(Verdict::valid().message.is_none());

        let rejected = Verdict::invalid("out of scope");
        assert!(!rejected.valid);
        assert_eq!(rejected.message.as_deref(), Some("out of scope"));
    }

    #[test]
    fn test_verdict_serialization_skips_empty_message() {
        let json = serde_json::to_string(&Verdict::valid()).unwrap();
        assert!(!json.contains("message"));
    }
}
