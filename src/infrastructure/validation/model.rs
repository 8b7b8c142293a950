//! Model-backed validation backend

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::generation::{GenerationProvider, GenerationRequest};
use crate::domain::validation::{ValidationInput, ValidationProvider, Verdict};
use crate::domain::DomainError;
use crate::infrastructure::generation::parse_json_object;

const GUARDRAIL_PROMPT: &str = "You are the entry guardrail for a water treatment plant support \
assistant. Decide whether the user message is an acceptable support question. Offensive, \
abusive, or clearly malicious messages are not acceptable; everything else is. Reply with a \
strict JSON object: {\"flag\": 0} when acceptable, or {\"flag\": 1, \"message\": \"<short \
polite refusal>\"} when not. No other text.";

const JUDGE_PROMPT: &str = "You are the exit judge for a water treatment plant support \
assistant. Given the user question, the retrieved context and the drafted answer, decide \
whether the answer is grounded in the context and appropriate to send. Reply with a strict \
JSON object: {\"flag\": 0} when the answer may be sent, or {\"flag\": 1, \"message\": \"<short \
replacement answer for the user>\"} when it may not. No other text.";

/// Which end of the pipeline this backend guards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorRole {
    Guardrail,
    Judge,
}

impl ValidatorRole {
    fn system_prompt(&self) -> &'static str {
        match self {
            Self::Guardrail => GUARDRAIL_PROMPT,
            Self::Judge => JUDGE_PROMPT,
        }
    }
}

/// Structured model reply: flag 0 = valid, 1 = invalid
#[derive(Debug, Deserialize)]
struct FlagReply {
    flag: i32,
    message: Option<String>,
}

/// Asks a generative model for a validity verdict as strict JSON.
///
/// One instance per (role, model) pair; the fallback chain stacks several
/// of these with different model names.
#[derive(Debug)]
pub struct ModelValidator {
    provider: Arc<dyn GenerationProvider>,
    model: String,
    role: ValidatorRole,
}

impl ModelValidator {
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        model: impl Into<String>,
        role: ValidatorRole,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            role,
        }
    }

    fn build_request(&self, input: &ValidationInput) -> GenerationRequest {
        match input {
            ValidationInput::Query { query, history } => GenerationRequest::new(query.clone())
                .with_system_prompt(self.role.system_prompt())
                .with_history(history.clone())
                .with_json_output(),
            ValidationInput::Answer {
                query,
                answer,
                context,
                history,
            } => {
                let body = format!(
                    "Context:\n{context}\n\nDrafted answer:\n{answer}\n\nUser question:\n{query}"
                );
                GenerationRequest::new(body)
                    .with_system_prompt(self.role.system_prompt())
                    .with_history(history.clone())
                    .with_json_output()
            }
        }
    }
}

#[async_trait]
impl ValidationProvider for ModelValidator {
    async fn validate(&self, input: &ValidationInput) -> Result<Verdict, DomainError> {
        let request = self.build_request(input);
        let output = self.provider.generate(&self.model, request).await?;

        let reply: FlagReply = parse_json_object(&output)?;

        if reply.flag == 0 {
            Ok(Verdict::valid())
        } else {
            Ok(Verdict {
                valid: false,
                message: reply.message,
            })
        }
    }

    fn provider_name(&self) -> &'static str {
        match self.role {
            ValidatorRole::Guardrail => "model-guardrail",
            ValidatorRole::Judge => "model-judge",
        }
    }
}
