use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("runner failed: {0}")]
    Runner(#[from] RunnerError),
    #[error("engine failed: {0}")]
    Engine(#[from] super::engine::EngineError),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Internal runner faults. Expected child failures (nonzero exit, timeout,
/// denied commands) never take this path; they are encoded in
/// [`crate::runner::CommandResult`] fields instead.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("stream io error: {stream} {source}")]
    StreamIo {
        stream: &'static str,
        source: std::io::Error,
    },
    #[error("internal runner error: {0}")]
    Internal(String),
}
