//! Sliding-window chunking of corpus entries

use serde::{Deserialize, Serialize};

use super::CorpusEntry;
use crate::domain::DomainError;

/// Configuration for the sliding-window chunker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Window size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive windows in characters
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.chunk_size == 0 {
            return Err(DomainError::validation("chunk_size must be greater than 0"));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(DomainError::validation(
                "chunk_overlap must be less than chunk_size",
            ));
        }

        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 700,
            chunk_overlap: 150,
        }
    }
}

/// A fixed-size, overlapping text window derived from one corpus entry
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Window content, trimmed of surrounding whitespace
    pub text: String,
    /// Index of the source entry in the loaded corpus
    pub entry_index: usize,
    /// Position of this chunk within its entry (0-based)
    pub position: usize,
}

impl Chunk {
    pub fn new(text: impl Into<String>, entry_index: usize, position: usize) -> Self {
        Self {
            text: text.into(),
            entry_index,
            position,
        }
    }
}

/// Split every entry into overlapping windows.
///
/// The window advances by `chunk_size - chunk_overlap` characters per step and
/// stops once it reaches the end of the text. Windows are trimmed and empty
/// ones dropped. Deterministic for fixed input and fixed config.
pub fn chunk_entries(entries: &[CorpusEntry], config: &ChunkingConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    for (entry_index, entry) in entries.iter().enumerate() {
        let text = entry.joined_text();
        if text.is_empty() {
            continue;
        }

        let mut position = 0;
        for window in split_windows(&text, config.chunk_size, config.chunk_overlap) {
            chunks.push(Chunk::new(window, entry_index, position));
            position += 1;
        }
    }

    chunks
}

/// Slide a window over `text`, counting in characters so multi-byte input
/// never splits inside a code point.
fn split_windows(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let mut windows = Vec::new();
    let mut start = 0;

    while start < n {
        let end = usize::min(n, start + chunk_size);
        let window: String = chars[start..end].iter().collect();
        let trimmed = window.trim();
        if !trimmed.is_empty() {
            windows.push(trimmed.to_string());
        }
        if end == n {
            break;
        }
        start = end - chunk_overlap;
    }

    windows
}
