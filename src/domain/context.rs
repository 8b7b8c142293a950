//! Context inputs arriving at the pipeline in different shapes

use serde::{Deserialize, Serialize};

/// A piece of context handed to a specialist. Callers supply plain strings,
/// structured corpus entries, or scored retrieval output; everything is
/// normalized to plain text before it reaches a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextSource {
    TitledEntry {
        #[serde(default)]
        title: String,
        #[serde(default)]
        section: String,
        content: String,
    },
    ScoredPair {
        score: f32,
        text: String,
    },
    RawText(String),
}

impl ContextSource {
    /// Plain-text rendering used by prompts and overlap matching
    pub fn as_text(&self) -> String {
        match self {
            Self::RawText(text) => text.clone(),
            Self::ScoredPair { text, .. } => text.clone(),
            Self::TitledEntry {
                title,
                section,
                content,
            } => [title, section, content]
                .iter()
                .filter(|part| !part.is_empty())
                .map(|part| part.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl From<String> for ContextSource {
    fn from(text: String) -> Self {
        Self::RawText(text)
    }
}

impl From<&str> for ContextSource {
    fn from(text: &str) -> Self {
        Self::RawText(text.to_string())
    }
}

/// Normalize a mixed context list to plain text, dropping empty items
pub fn normalize_contexts(sources: &[ContextSource]) -> Vec<String> {
    sources
        .iter()
        .map(ContextSource::as_text)
        .filter(|text| !text.trim().is_empty())
        .collect()
}
