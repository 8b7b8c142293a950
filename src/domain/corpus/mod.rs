//! Corpus model: entries, chunking, lexical indexing, snapshots

mod chunker;
mod entry;
mod index;
mod snapshot;

pub use chunker::{chunk_entries, Chunk, ChunkingConfig};
pub use entry::CorpusEntry;
pub use index::{normalize, token_set, tokenize, LexicalIndex};
pub use snapshot::CorpusSnapshot;
