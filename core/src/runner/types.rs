use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Synthesized when the safety classifier blocks a command before spawn.
pub const EXIT_BLOCKED: i32 = -1;
/// Synthesized when a command is killed for exceeding its timeout.
pub const EXIT_TIMEOUT: i32 = -2;
/// Synthesized when spawning or communicating with the child fails.
pub const EXIT_SPAWN_FAILURE: i32 = -3;
/// Synthesized when a parallel execution task itself fails to complete.
pub const EXIT_PARALLEL_FAILURE: i32 = -4;

/// Outcome of one child process invocation. Immutable once constructed;
/// retries are the caller's responsibility.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Wall-clock seconds spent executing.
    pub execution_time: f64,
    pub success: bool,
    pub pid: Option<u32>,
}

impl CommandResult {
    /// Synthetic failure with a sentinel exit code; no process was involved
    /// (or it never produced usable output).
    pub fn failure(command: impl Into<String>, exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            execution_time: 0.0,
            success: false,
            pid: None,
        }
    }
}

/// Execution parameters for one command.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub working_directory: PathBuf,
    /// Merged over the inherited process environment.
    pub environment: HashMap<String, String>,
    pub timeout: Option<Duration>,
    /// Gates the safety classifier in the command executor.
    pub safe_mode: bool,
}

impl CommandContext {
    pub fn new(working_directory: impl Into<PathBuf>) -> Self {
        Self {
            working_directory: working_directory.into(),
            environment: HashMap::new(),
            timeout: None,
            safe_mode: true,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn unsafe_mode(mut self) -> Self {
        self.safe_mode = false;
        self
    }
}

impl Default for CommandContext {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}
