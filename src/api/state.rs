//! Shared application state

use std::sync::Arc;

use crate::infrastructure::pipeline::ChatPipeline;

/// State handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ChatPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<ChatPipeline>) -> Self {
        Self { pipeline }
    }
}
