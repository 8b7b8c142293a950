//! Domain layer - core contracts and entities

pub mod context;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod memory;
pub mod retrieval;
pub mod routing;
pub mod validation;

pub use context::{normalize_contexts, ContextSource};
pub use corpus::{
    chunk_entries, normalize, token_set, tokenize, Chunk, ChunkingConfig, CorpusEntry,
    CorpusSnapshot, LexicalIndex,
};
pub use embedding::EmbeddingProvider;
pub use error::DomainError;
pub use generation::{FewShot, GenerationProvider, GenerationRequest, Message, MessageRole};
pub use memory::{record_exchange, SessionMemory};
pub use retrieval::{ContextRetriever, RetrievalConfig, ScoredContext};
pub use routing::{RouteClassifier, RouteDecision, RouteTag, Router};
pub use validation::{ValidationInput, ValidationProvider, Verdict};
