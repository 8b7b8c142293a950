//! Ordered fallback across interchangeable validation backends

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::domain::validation::{ValidationInput, ValidationProvider, Verdict};

/// Tries an ordered list of validation backends until one responds.
///
/// Unavailability-class failures (missing configuration, provider errors,
/// timeouts) advance to the next backend; the first backend that answers
/// wins and iteration stops. If the whole list is exhausted - or a backend
/// fails in a way retrying cannot help - the check fails open as valid:
/// an unreachable moderation capability must not block the conversation.
#[derive(Debug)]
pub struct FallbackValidator {
    backends: Vec<Arc<dyn ValidationProvider>>,
    timeout: Duration,
}

impl FallbackValidator {
    pub fn new(backends: Vec<Arc<dyn ValidationProvider>>, timeout: Duration) -> Self {
        Self { backends, timeout }
    }

    /// Run the check. Total: always produces a verdict.
    pub async fn validate(&self, input: &ValidationInput) -> Verdict {
        for backend in &self.backends {
            let outcome = tokio::time::timeout(self.timeout, backend.validate(input)).await;

            match outcome {
                Ok(Ok(verdict)) => return verdict,
                Ok(Err(error)) if error.is_unavailable() => {
                    warn!(
                        backend = backend.provider_name(),
                        %error,
                        "validation backend unavailable; trying next"
                    );
                }
                Ok(Err(error)) => {
                    warn!(
                        backend = backend.provider_name(),
                        %error,
                        "validation backend failed; failing open"
                    );
                    return Verdict::valid();
                }
                Err(_) => {
                    warn!(
                        backend = backend.provider_name(),
                        "validation backend timed out; trying next"
                    );
                }
            }
        }

        Verdict::valid()
    }
}
