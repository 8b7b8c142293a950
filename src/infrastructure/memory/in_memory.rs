//! In-memory session store

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::memory::SessionMemory;
use crate::domain::{DomainError, Message};

/// Process-local session log. Suitable for single-instance deployments and
/// tests; a shared store can replace it behind the same trait.
#[derive(Debug, Default)]
pub struct InMemorySessionMemory {
    sessions: RwLock<HashMap<String, Vec<Message>>>,
}

impl InMemorySessionMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionMemory for InMemorySessionMemory {
    async fn get(&self, session_id: &str) -> Result<Vec<Message>, DomainError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned().unwrap_or_default())
    }

    async fn append(&self, session_id: &str, message: Message) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_default()
            .push(message);
        Ok(())
    }
}
