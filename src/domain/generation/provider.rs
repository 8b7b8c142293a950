//! Generation capability contract

use async_trait::async_trait;
use std::fmt::Debug;

use super::{FewShot, Message};
use crate::domain::DomainError;

/// Everything a specialist hands the generative model for one answer
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub fewshots: Vec<FewShot>,
    pub history: Vec<Message>,
    pub context: String,
    pub query: String,
    pub temperature: Option<f32>,
    /// Ask the provider for a strict JSON object response
    pub json_output: bool,
}

impl GenerationRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_fewshots(mut self, fewshots: Vec<FewShot>) -> Self {
        self.fewshots = fewshots;
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }

    /// Flatten into the message list a chat-completions API expects:
    /// system, few-shot pairs, history, then the context-bearing user turn.
    pub fn into_messages(self) -> Vec<Message> {
        let mut messages = Vec::new();

        if !self.system_prompt.is_empty() {
            messages.push(Message::system(self.system_prompt));
        }

        for shot in self.fewshots {
            messages.push(Message::user(shot.user));
            messages.push(Message::assistant(shot.assistant));
        }

        messages.extend(self.history);

        let final_turn = if self.context.is_empty() {
            self.query
        } else {
            format!("Context:\n{}\n\nQuestion:\n{}", self.context, self.query)
        };
        messages.push(Message::user(final_turn));

        messages
    }
}

/// Text-generation capability (one model call, no streaming)
#[async_trait]
pub trait GenerationProvider: Send + Sync + Debug {
    /// Generate an answer with the named model
    async fn generate(&self, model: &str, request: GenerationRequest)
        -> Result<String, DomainError>;

    /// Provider name for logs and error messages
    fn provider_name(&self) -> &'static str;
}
