//! Embedding infrastructure

mod openai;

pub use openai::OpenAiEmbeddingProvider;
