//! Immutable corpus snapshots shared across requests

use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::OnceCell;

use super::{Chunk, CorpusEntry, LexicalIndex};

/// One fully-built view of the corpus: entries, chunk set and lexical index,
/// keyed by the source file's modification time.
///
/// Snapshots are replaced wholesale (build-then-swap), never mutated, so a
/// reader holding an `Arc<CorpusSnapshot>` keeps a consistent view for as
/// long as it needs one.
#[derive(Debug)]
pub struct CorpusSnapshot {
    pub entries: Vec<CorpusEntry>,
    pub chunks: Vec<Chunk>,
    pub index: LexicalIndex,
    pub source_mtime: SystemTime,
    /// Lazily-populated chunk embeddings. The cell is either empty or holds a
    /// vector per chunk; concurrent initializers are collapsed into a single
    /// embedding pass, and a failed pass leaves the cell empty for the next
    /// attempt. Dies with the snapshot, so stale vectors can never outlive
    /// their chunks.
    vectors: OnceCell<Arc<Vec<Vec<f32>>>>,
}

impl CorpusSnapshot {
    pub fn new(
        entries: Vec<CorpusEntry>,
        chunks: Vec<Chunk>,
        index: LexicalIndex,
        source_mtime: SystemTime,
    ) -> Self {
        Self {
            entries,
            chunks,
            index,
            source_mtime,
            vectors: OnceCell::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunk vectors, computing them once via `init` on first access.
    pub async fn chunk_vectors<F, Fut, E>(&self, init: F) -> Result<Arc<Vec<Vec<f32>>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Vec<Vec<f32>>, E>>,
    {
        let vectors = self
            .vectors
            .get_or_try_init(|| async { init().await.map(Arc::new) })
            .await?;
        Ok(vectors.clone())
    }

    /// Vectors already computed for this snapshot, if any
    pub fn cached_vectors(&self) -> Option<Arc<Vec<Vec<f32>>>> {
        self.vectors.get().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::corpus::{chunk_entries, ChunkingConfig};
    use crate::domain::DomainError;

    fn snapshot() -> CorpusSnapshot {
        let entries = vec![CorpusEntry::new("Pressure", "", "Normal range is 10 to 20 psi")];
        let chunks = chunk_entries(&entries, &ChunkingConfig::default());
        let index = LexicalIndex::build(&chunks);
        CorpusSnapshot::new(entries, chunks, index, SystemTime::UNIX_EPOCH)
    }

    #[tokio::test]
    async fn test_vectors_computed_once() {
        let snapshot = snapshot();

        let first = snapshot
            .chunk_vectors(|| async { Ok::<_, DomainError>(vec![vec![1.0, 0.0]]) })
            .await
            .unwrap();
        // A second initializer never runs; the memoized vectors come back
        let second = snapshot
            .chunk_vectors(|| async { Ok::<_, DomainError>(vec![vec![9.9, 9.9]]) })
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second[0], vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_failed_init_leaves_cell_empty() {
        let snapshot = snapshot();

        let result = snapshot
            .chunk_vectors(|| async { Err(DomainError::provider("embed", "down")) })
            .await;
        assert!(result.is_err());
        assert!(snapshot.cached_vectors().is_none());

        let retry = snapshot
            .chunk_vectors(|| async { Ok::<_, DomainError>(vec![vec![0.5]]) })
            .await;
        assert!(retry.is_ok());
        assert!(snapshot.cached_vectors().is_some());
    }
}
