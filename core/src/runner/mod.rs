mod process;
mod registry;
mod types;

pub use process::ProcessRunner;
pub(crate) use process::{drain, exit_code_of, shell_command};
pub use registry::{CleanupOutcome, ProcessRegistry};
pub use types::{
    CommandContext, CommandResult, EXIT_BLOCKED, EXIT_PARALLEL_FAILURE, EXIT_SPAWN_FAILURE,
    EXIT_TIMEOUT,
};
