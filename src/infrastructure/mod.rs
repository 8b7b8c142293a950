//! Infrastructure layer - concrete implementations of the domain contracts

pub mod classifier;
pub mod corpus;
pub mod embedding;
pub mod generation;
pub mod logging;
pub mod memory;
pub mod pipeline;
pub mod retrieval;
pub mod router;
pub mod specialists;
pub mod validation;
