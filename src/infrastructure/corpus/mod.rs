//! File-backed corpus loading with snapshot caching

mod loader;

pub use loader::CorpusStore;
