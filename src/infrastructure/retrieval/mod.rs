//! Hybrid retrieval engine

mod hybrid;

pub use hybrid::HybridRetriever;
