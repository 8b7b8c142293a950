//! Corpus entries as loaded from the knowledge file

use serde::{Deserialize, Serialize};

/// A single knowledge-base entry from the corpus source file.
///
/// Entries are immutable once loaded for a given source version; a changed
/// source file produces a fresh entry list, never an in-place edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub content: String,
    /// Precomputed embedding for the whole entry, if the corpus file ships one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl CorpusEntry {
    pub fn new(
        title: impl Into<String>,
        section: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            section: section.into(),
            content: content.into(),
            embedding: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Title, section and content joined with newlines, empty fields skipped.
    /// This is the text the chunker slides over.
    pub fn joined_text(&self) -> String {
        [&self.title, &self.section, &self.content]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.section.is_empty() && self.content.is_empty()
    }
}
