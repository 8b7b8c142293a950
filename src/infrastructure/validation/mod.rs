//! Validation backends: ordered fail-open fallback and a model-backed
//! implementation

mod fallback;
mod model;

pub use fallback::FallbackValidator;
pub use model::{ModelValidator, ValidatorRole};
