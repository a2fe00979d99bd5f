use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Instant;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::error::RunnerError;

use super::registry::{CleanupOutcome, ProcessRegistry};
use super::types::{CommandContext, CommandResult, EXIT_SPAWN_FAILURE, EXIT_TIMEOUT};

/// Runs one shell command as a child process and captures its output.
///
/// Expected failures (nonzero exit, timeout, spawn errors) never surface as
/// `Err`; they are encoded in the returned [`CommandResult`]. Children are
/// tracked in the shared [`ProcessRegistry`] for the duration of the wait so
/// they can be killed externally.
#[derive(Clone)]
pub struct ProcessRunner {
    registry: Arc<ProcessRegistry>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ProcessRegistry::new()),
        }
    }

    /// Share an existing registry, e.g. between the command executor and the
    /// plan engine, so both track children in one place.
    pub fn with_registry(registry: Arc<ProcessRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ProcessRegistry> {
        &self.registry
    }

    pub async fn run(&self, command: &str, ctx: &CommandContext) -> CommandResult {
        let started = Instant::now();
        match self.spawn_and_wait(command, ctx).await {
            Ok(outcome) => outcome.into_result(command, started),
            Err(e) => {
                tracing::debug!(%command, error = %e, "runner internal failure");
                CommandResult {
                    execution_time: started.elapsed().as_secs_f64(),
                    ..CommandResult::failure(command, EXIT_SPAWN_FAILURE, e.to_string())
                }
            }
        }
    }

    async fn spawn_and_wait(
        &self,
        command: &str,
        ctx: &CommandContext,
    ) -> Result<WaitOutcome, RunnerError> {
        let mut cmd = shell_command(command);
        cmd.current_dir(&ctx.working_directory)
            .envs(&ctx.environment)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| RunnerError::Spawn(e.to_string()))?;
        let pid = child.id();

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RunnerError::Spawn("no stdout pipe".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RunnerError::Spawn("no stderr pipe".into()))?;
        let out_task = drain(stdout, "stdout");
        let err_task = drain(stderr, "stderr");

        let (kill_tx, mut kill_rx) = mpsc::channel::<()>(1);
        if let Some(pid) = pid {
            self.registry.register(pid, kill_tx);
        }

        let waited = wait_child(&mut child, ctx, &mut kill_rx).await;

        // The pid leaves the registry on every path, including teardown errors.
        if let Some(pid) = pid {
            self.registry.remove(pid);
        }

        match waited {
            Waited::Exited(Ok(status)) => {
                let stdout = join_drain(out_task).await?;
                let stderr = join_drain(err_task).await?;
                Ok(WaitOutcome::Exited {
                    status,
                    stdout,
                    stderr,
                    pid,
                })
            }
            Waited::Exited(Err(e)) => Err(RunnerError::Spawn(e.to_string())),
            Waited::Deadline => {
                let (cleanup, _) = teardown(&mut child).await;
                if let CleanupOutcome::Ignored(reason) = &cleanup {
                    tracing::warn!(%command, reason, "timeout teardown was not clean");
                }
                out_task.abort();
                err_task.abort();
                Ok(WaitOutcome::TimedOut {
                    pid,
                    timeout_secs: ctx.timeout.map(|t| t.as_secs_f64()).unwrap_or(0.0),
                })
            }
            Waited::Killed => {
                let (cleanup, status) = teardown(&mut child).await;
                if let CleanupOutcome::Ignored(reason) = &cleanup {
                    tracing::warn!(%command, reason, "kill teardown was not clean");
                }
                // The child is dead, so the pipes hit EOF and the drains finish.
                let stdout = join_drain(out_task).await.unwrap_or_default();
                let stderr = join_drain(err_task).await.unwrap_or_default();
                Ok(WaitOutcome::Killed {
                    status,
                    stdout,
                    stderr,
                    pid,
                })
            }
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

enum Waited {
    Exited(std::io::Result<ExitStatus>),
    Deadline,
    Killed,
}

async fn wait_child(child: &mut Child, ctx: &CommandContext, kill_rx: &mut mpsc::Receiver<()>) -> Waited {
    match ctx.timeout {
        Some(timeout) => tokio::select! {
            res = child.wait() => Waited::Exited(res),
            () = sleep(timeout) => Waited::Deadline,
            _ = kill_rx.recv() => Waited::Killed,
        },
        None => tokio::select! {
            res = child.wait() => Waited::Exited(res),
            _ = kill_rx.recv() => Waited::Killed,
        },
    }
}

enum WaitOutcome {
    Exited {
        status: ExitStatus,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
        pid: Option<u32>,
    },
    TimedOut {
        pid: Option<u32>,
        timeout_secs: f64,
    },
    Killed {
        status: Option<ExitStatus>,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
        pid: Option<u32>,
    },
}

impl WaitOutcome {
    fn into_result(self, command: &str, started: Instant) -> CommandResult {
        let execution_time = started.elapsed().as_secs_f64();
        match self {
            Self::Exited {
                status,
                stdout,
                stderr,
                pid,
            } => {
                let exit_code = exit_code_of(status);
                CommandResult {
                    command: command.to_string(),
                    exit_code,
                    stdout: decode(&stdout),
                    stderr: decode(&stderr),
                    execution_time,
                    success: exit_code == 0,
                    pid,
                }
            }
            Self::TimedOut { pid, timeout_secs } => CommandResult {
                command: command.to_string(),
                exit_code: EXIT_TIMEOUT,
                stdout: String::new(),
                stderr: format!("command exceeded {timeout_secs:.0}s timeout and was killed"),
                execution_time,
                success: false,
                pid,
            },
            Self::Killed {
                status,
                stdout,
                stderr,
                pid,
            } => {
                let exit_code = status.map(exit_code_of).unwrap_or(EXIT_SPAWN_FAILURE);
                CommandResult {
                    command: command.to_string(),
                    exit_code,
                    stdout: decode(&stdout),
                    stderr: decode(&stderr),
                    execution_time,
                    success: exit_code == 0,
                    pid,
                }
            }
        }
    }
}

/// Best-effort child teardown: kill, then reap. Secondary errors are
/// captured, not raised.
async fn teardown(child: &mut Child) -> (CleanupOutcome, Option<ExitStatus>) {
    if let Err(e) = child.start_kill() {
        return (CleanupOutcome::Ignored(format!("kill failed: {e}")), None);
    }
    match child.wait().await {
        Ok(status) => (CleanupOutcome::Clean, Some(status)),
        Err(e) => (
            CleanupOutcome::Ignored(format!("wait after kill failed: {e}")),
            None,
        ),
    }
}

/// Build a platform shell invocation for a single command string.
/// Quoting inside `command` is the caller's responsibility.
pub(crate) fn shell_command(command: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    }
    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }
}

/// Collect a child stream to EOF on a separate task.
pub(crate) fn drain<R>(mut rd: R, stream: &'static str) -> JoinHandle<Result<Vec<u8>, RunnerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        rd.read_to_end(&mut buf)
            .await
            .map_err(|e| RunnerError::StreamIo { stream, source: e })?;
        Ok(buf)
    })
}

async fn join_drain(task: JoinHandle<Result<Vec<u8>, RunnerError>>) -> Result<Vec<u8>, RunnerError> {
    task.await
        .map_err(|e| RunnerError::Internal(format!("stream task join failed: {e}")))?
}

pub(crate) fn exit_code_of(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    status.code().unwrap_or(EXIT_SPAWN_FAILURE)
}

fn decode(bytes: &[u8]) -> String {
    // Invalid bytes are replaced, never raised.
    String::from_utf8_lossy(bytes).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ctx() -> CommandContext {
        CommandContext::default()
    }

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let runner = ProcessRunner::new();
        let result = runner.run("echo hello", &ctx()).await;
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "hello");
        assert!(result.pid.is_some());
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_result_not_an_error() {
        let runner = ProcessRunner::new();
        let result = runner.run("exit 3", &ctx()).await;
        assert!(!result.success);
        assert_eq!(result.exit_code, 3);
    }

    #[tokio::test]
    async fn environment_overrides_are_merged() {
        let runner = ProcessRunner::new();
        let ctx = ctx().with_env("AUTOEXEC_TEST_VAR", "42");
        let result = runner.run("echo $AUTOEXEC_TEST_VAR", &ctx).await;
        assert_eq!(result.stdout, "42");
    }

    #[tokio::test]
    async fn working_directory_is_honored() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new();
        let result = runner.run("pwd", &CommandContext::new(dir.path())).await;
        assert!(result.stdout.contains(
            dir.path()
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
        ));
    }

    #[tokio::test]
    async fn bad_working_directory_yields_spawn_sentinel() {
        let runner = ProcessRunner::new();
        let ctx = CommandContext::new("/definitely/not/a/real/dir");
        let result = runner.run("echo hi", &ctx).await;
        assert!(!result.success);
        assert_eq!(result.exit_code, EXIT_SPAWN_FAILURE);
        assert!(!result.stderr.is_empty());
    }

    #[tokio::test]
    async fn timeout_kills_the_child() {
        let runner = ProcessRunner::new();
        let ctx = ctx().with_timeout(Duration::from_millis(300));
        let started = Instant::now();
        let result = runner.run("sleep 5", &ctx).await;
        assert_eq!(result.exit_code, EXIT_TIMEOUT);
        assert!(result.stdout.is_empty());
        assert!(result.stderr.contains("timeout"));
        assert!(started.elapsed() < Duration::from_secs(3));
        // Nothing left behind in the registry.
        assert!(runner.registry().is_empty());
    }
}
