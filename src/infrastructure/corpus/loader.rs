//! Corpus store: loads the knowledge file, rebuilds on change, serves
//! immutable snapshots

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::domain::corpus::{chunk_entries, ChunkingConfig, CorpusEntry, CorpusSnapshot, LexicalIndex};
use crate::domain::DomainError;

/// Owns the process-wide corpus state. The snapshot is keyed by the source
/// file's modification time: an unchanged file returns the cached snapshot,
/// a changed one triggers a full rebuild that is published atomically, and a
/// failed reload keeps serving the previous snapshot.
#[derive(Debug)]
pub struct CorpusStore {
    path: PathBuf,
    chunking: ChunkingConfig,
    current: RwLock<Option<Arc<CorpusSnapshot>>>,
}

impl CorpusStore {
    pub fn new(path: impl Into<PathBuf>, chunking: ChunkingConfig) -> Result<Self, DomainError> {
        chunking.validate()?;
        Ok(Self {
            path: path.into(),
            chunking,
            current: RwLock::new(None),
        })
    }

    /// The current snapshot, rebuilding first if the source file changed.
    ///
    /// Errors only when the source is unreadable or malformed AND no prior
    /// snapshot exists; with a prior snapshot the reload failure is logged
    /// and the stale snapshot served.
    pub async fn snapshot(&self) -> Result<Arc<CorpusSnapshot>, DomainError> {
        let mtime = match self.source_mtime() {
            Ok(mtime) => mtime,
            Err(error) => return self.serve_stale(error).await,
        };

        {
            let current = self.current.read().await;
            if let Some(snapshot) = current.as_ref() {
                if snapshot.source_mtime == mtime {
                    return Ok(snapshot.clone());
                }
            }
        }

        // Build the replacement off to the side, outside any lock
        let built = match self.build(mtime).await {
            Ok(snapshot) => Arc::new(snapshot),
            Err(error) => return self.serve_stale(error).await,
        };

        let mut current = self.current.write().await;
        // A concurrent rebuilder may have published the same version while
        // this one was reading the file; keep whichever is already in place.
        if let Some(snapshot) = current.as_ref() {
            if snapshot.source_mtime == mtime {
                return Ok(snapshot.clone());
            }
        }

        info!(
            chunks = built.chunks.len(),
            entries = built.entries.len(),
            "corpus snapshot published"
        );
        *current = Some(built.clone());
        Ok(built)
    }

    fn source_mtime(&self) -> Result<SystemTime, DomainError> {
        let metadata = std::fs::metadata(&self.path)
            .map_err(|e| DomainError::corpus(format!("cannot stat {}: {e}", self.path.display())))?;
        metadata
            .modified()
            .map_err(|e| DomainError::corpus(format!("no modification time: {e}")))
    }

    async fn build(&self, mtime: SystemTime) -> Result<CorpusSnapshot, DomainError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| DomainError::corpus(format!("cannot read {}: {e}", self.path.display())))?;

        let entries: Vec<CorpusEntry> = serde_json::from_str(&raw)
            .map_err(|e| DomainError::corpus(format!("malformed corpus file: {e}")))?;

        let chunks = chunk_entries(&entries, &self.chunking);
        let index = LexicalIndex::build(&chunks);

        Ok(CorpusSnapshot::new(entries, chunks, index, mtime))
    }

    async fn serve_stale(&self, error: DomainError) -> Result<Arc<CorpusSnapshot>, DomainError> {
        let current = self.current.read().await;
        match current.as_ref() {
            Some(snapshot) => {
                warn!(%error, "corpus reload failed; serving previous snapshot");
                Ok(snapshot.clone())
            }
            None => Err(error),
        }
    }
}
