use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::config::ExecutorConfig;
use crate::runner::{
    drain, exit_code_of, shell_command, CommandContext, CommandResult, ProcessRunner,
    EXIT_BLOCKED, EXIT_PARALLEL_FAILURE, EXIT_SPAWN_FAILURE,
};
use crate::safety::SafetyClassifier;

use super::history::CommandHistory;

const BLOCKED_MESSAGE: &str = "command blocked by safety policy";

/// Safe command execution front door: composes the safety classifier with
/// the process runner and keeps a bounded in-memory history.
///
/// Child failures never raise; they are encoded in the returned
/// [`CommandResult`].
#[derive(Clone)]
pub struct CommandExecutor {
    inner: Arc<Inner>,
}

struct Inner {
    runner: ProcessRunner,
    classifier: SafetyClassifier,
    history: Mutex<CommandHistory>,
    interactive_poll: Duration,
}

impl CommandExecutor {
    pub fn new(classifier: SafetyClassifier, cfg: &ExecutorConfig) -> Self {
        Self::with_runner(ProcessRunner::new(), classifier, cfg)
    }

    pub fn with_runner(
        runner: ProcessRunner,
        classifier: SafetyClassifier,
        cfg: &ExecutorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                runner,
                classifier,
                history: Mutex::new(CommandHistory::new(cfg.history_limit)),
                interactive_poll: Duration::from_millis(cfg.interactive_poll_ms),
            }),
        }
    }

    pub async fn execute_command(&self, command: &str, ctx: &CommandContext) -> CommandResult {
        if ctx.safe_mode && !self.inner.classifier.is_safe(command).await {
            tracing::warn!(%command, "blocked by safety classifier");
            return CommandResult::failure(command, EXIT_BLOCKED, BLOCKED_MESSAGE);
        }

        let result = self.inner.runner.run(command, ctx).await;
        self.record(result.clone());
        result
    }

    /// Run commands strictly in sequence. In safe mode the batch stops at
    /// the first failure; remaining commands are not attempted.
    pub async fn execute_batch(
        &self,
        commands: &[String],
        ctx: &CommandContext,
    ) -> Vec<CommandResult> {
        let mut results = Vec::with_capacity(commands.len());
        for command in commands {
            let result = self.execute_command(command, ctx).await;
            let failed = !result.success;
            results.push(result);
            if failed && ctx.safe_mode {
                tracing::debug!(%command, "batch stopped at first failure");
                break;
            }
        }
        results
    }

    /// Launch all commands concurrently; the result list preserves input
    /// order regardless of completion order. A task that fails to complete
    /// becomes a synthetic result rather than an error.
    pub async fn execute_parallel(
        &self,
        commands: &[String],
        ctx: &CommandContext,
    ) -> Vec<CommandResult> {
        let mut handles = Vec::with_capacity(commands.len());
        for command in commands {
            let executor = self.clone();
            let ctx = ctx.clone();
            let command = command.clone();
            handles.push(tokio::spawn(async move {
                executor.execute_command(&command, &ctx).await
            }));
        }

        futures::future::join_all(handles)
            .await
            .into_iter()
            .zip(commands)
            .map(|(joined, command)| match joined {
                Ok(result) => result,
                Err(e) => CommandResult::failure(
                    command,
                    EXIT_PARALLEL_FAILURE,
                    format!("parallel execution failed: {e}"),
                ),
            })
            .collect()
    }

    /// Best-effort line-oriented interaction (not a full PTY): stdout is
    /// polled in small chunks and `on_prompt` is consulted whenever a chunk
    /// looks like an interactive prompt; its reply is written to stdin.
    pub async fn execute_interactive<F>(
        &self,
        command: &str,
        ctx: &CommandContext,
        mut on_prompt: F,
    ) -> CommandResult
    where
        F: FnMut(&str) -> Option<String> + Send,
    {
        if ctx.safe_mode && !self.inner.classifier.is_safe(command).await {
            tracing::warn!(%command, "interactive command blocked by safety classifier");
            return CommandResult::failure(command, EXIT_BLOCKED, BLOCKED_MESSAGE);
        }

        let started = Instant::now();
        let mut cmd = shell_command(command);
        cmd.current_dir(&ctx.working_directory)
            .envs(&ctx.environment)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return CommandResult {
                    execution_time: started.elapsed().as_secs_f64(),
                    ..CommandResult::failure(
                        command,
                        EXIT_SPAWN_FAILURE,
                        format!("spawn failed: {e}"),
                    )
                }
            }
        };
        let pid = child.id();

        let mut stdin = child.stdin.take();
        let mut stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let err_task = stderr.map(|rd| drain(rd, "stderr"));

        let (kill_tx, mut kill_rx) = mpsc::channel::<()>(1);
        if let Some(pid) = pid {
            self.inner.runner.registry().register(pid, kill_tx);
        }

        let mut collected: Vec<u8> = Vec::new();
        let mut buf = [0u8; 1024];

        if let Some(out) = stdout.as_mut() {
            loop {
                match tokio::time::timeout(self.inner.interactive_poll, out.read(&mut buf)).await {
                    Ok(Ok(0)) | Ok(Err(_)) => break,
                    Ok(Ok(n)) => {
                        collected.extend_from_slice(&buf[..n]);
                        let chunk = String::from_utf8_lossy(&buf[..n]);
                        if looks_like_prompt(&chunk) {
                            if let Some(reply) = on_prompt(&chunk) {
                                if let Some(stdin) = stdin.as_mut() {
                                    let _ = stdin.write_all(reply.as_bytes()).await;
                                    let _ = stdin.write_all(b"\n").await;
                                    let _ = stdin.flush().await;
                                }
                            }
                        }
                    }
                    Err(_) => {
                        // No output inside the poll window; honor external
                        // kills and fall out once the child has exited.
                        if kill_rx.try_recv().is_ok() {
                            let _ = child.start_kill();
                        }
                        if matches!(child.try_wait(), Ok(Some(_))) {
                            break;
                        }
                    }
                }
            }
        }
        drop(stdin);

        let status = child.wait().await;
        if let Some(pid) = pid {
            self.inner.runner.registry().remove(pid);
        }

        let stderr_bytes = match err_task {
            Some(task) => task.await.ok().and_then(Result::ok).unwrap_or_default(),
            None => Vec::new(),
        };

        let result = match status {
            Ok(status) => {
                let exit_code = exit_code_of(status);
                CommandResult {
                    command: command.to_string(),
                    exit_code,
                    stdout: String::from_utf8_lossy(&collected).trim().to_string(),
                    stderr: String::from_utf8_lossy(&stderr_bytes).trim().to_string(),
                    execution_time: started.elapsed().as_secs_f64(),
                    success: exit_code == 0,
                    pid,
                }
            }
            Err(e) => CommandResult {
                execution_time: started.elapsed().as_secs_f64(),
                ..CommandResult::failure(command, EXIT_SPAWN_FAILURE, format!("wait failed: {e}"))
            },
        };

        self.record(result.clone());
        result
    }

    /// Request the kill of one tracked child.
    pub fn kill_process(&self, pid: u32) -> bool {
        self.inner.runner.registry().kill(pid)
    }

    /// Kill every tracked child; returns how many kill requests landed.
    pub fn kill_all_processes(&self) -> usize {
        self.inner.runner.registry().kill_all()
    }

    pub fn running_processes(&self) -> Vec<u32> {
        self.inner.runner.registry().running_pids()
    }

    pub fn history(&self, limit: usize) -> Vec<CommandResult> {
        self.lock_history().recent(limit)
    }

    pub fn clear_history(&self) {
        self.lock_history().clear();
    }

    /// The underlying runner, for sharing its process registry.
    pub fn runner(&self) -> &ProcessRunner {
        &self.inner.runner
    }

    fn record(&self, result: CommandResult) {
        self.lock_history().push(result);
    }

    fn lock_history(&self) -> std::sync::MutexGuard<'_, CommandHistory> {
        self.inner.history.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn looks_like_prompt(chunk: &str) -> bool {
    chunk
        .trim_end()
        .ends_with([':', '?', '>', '$', '#'])
}
