#[allow(clippy::module_inception)]
pub mod error;
pub mod engine;

pub use engine::EngineError;
pub use error::{CoreError, RunnerError};
