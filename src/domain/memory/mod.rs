//! Per-session conversation memory contract

use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::generation::{Message, MessageRole};
use crate::domain::DomainError;

/// Append-only per-session message log. Read by the guardrail, judge and
/// specialists; written by the orchestrator after a response is produced.
#[async_trait]
pub trait SessionMemory: Send + Sync + Debug {
    /// Messages for a session, oldest first
    async fn get(&self, session_id: &str) -> Result<Vec<Message>, DomainError>;

    /// Append one message to a session
    async fn append(&self, session_id: &str, message: Message) -> Result<(), DomainError>;
}

/// Convenience: append a user/assistant exchange
pub async fn record_exchange(
    memory: &dyn SessionMemory,
    session_id: &str,
    query: &str,
    answer: &str,
) -> Result<(), DomainError> {
    memory
        .append(
            session_id,
            Message {
                role: MessageRole::User,
                content: query.to_string(),
            },
        )
        .await?;
    memory
        .append(
            session_id,
            Message {
                role: MessageRole::Assistant,
                content: answer.to_string(),
            },
        )
        .await
}
