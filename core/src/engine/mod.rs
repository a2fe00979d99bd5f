//! Autonomous plan execution.
//!
//! The engine owns the whole instruction-to-report pipeline: parse the
//! instruction, walk the plan task by task, retry with repair on failure,
//! and emit an [`ExecutionReport`] at the end. Task failures never abort
//! the engine; they are recorded on the task and reflected in the plan
//! status.

mod progress;
mod repair;
mod report;

pub use report::{save_report, ExecutionReport, TaskReport};

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::planner::TaskPlanner;
use crate::runner::{CommandContext, CommandResult, ProcessRunner};
use crate::task::{CommandSpec, Platform, PlanStatus, Task, TaskPlan, TaskStatus};

use progress::ProgressMonitor;

/// Snapshot of the engine's state, for status commands and logging.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionStatus {
    pub running: bool,
    pub current_plan_id: Option<String>,
    pub current_task_index: usize,
    pub total_tasks: usize,
    pub plans_executed: usize,
}

/// Drives plans to completion against one project directory.
///
/// Engine-resolved commands run through the process runner directly; the
/// safety classifier gates user-supplied commands at the executor layer,
/// not the symbolic operations the planner emits.
pub struct AutonomousExecutor {
    project_path: PathBuf,
    runner: ProcessRunner,
    planner: TaskPlanner,
    cfg: EngineConfig,
    current_plan: Option<TaskPlan>,
    execution_history: Vec<TaskPlan>,
}

impl AutonomousExecutor {
    pub fn new(project_path: impl Into<PathBuf>, cfg: EngineConfig) -> Self {
        Self::with_runner(project_path, cfg, ProcessRunner::new())
    }

    /// Share a runner (and thus its process registry) with an executor.
    pub fn with_runner(
        project_path: impl Into<PathBuf>,
        cfg: EngineConfig,
        runner: ProcessRunner,
    ) -> Self {
        Self {
            project_path: project_path.into(),
            runner,
            planner: TaskPlanner::new(),
            cfg,
            current_plan: None,
            execution_history: Vec::new(),
        }
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    /// Parse the instruction and execute the resulting plan. Always yields
    /// a report; an instruction that plans nothing actionable still runs
    /// its final validation.
    pub async fn execute_natural_command(&mut self, instruction: &str) -> ExecutionReport {
        tracing::info!(instruction, "executing natural-language command");
        let plan = self.planner.parse(instruction);
        match self.execute_plan(plan).await {
            Ok(report) => report,
            // Unreachable for a freshly parsed plan, but the contract here
            // is report-in-all-cases.
            Err(e) => {
                tracing::error!(error = %e, "plan execution refused");
                let mut failed = TaskPlan::new(instruction, vec![]);
                failed.status = PlanStatus::Failed;
                ExecutionReport::from_plan(&failed, Duration::ZERO)
            }
        }
    }

    /// Execute a prepared plan. A plan in a terminal state cannot be rerun.
    pub async fn execute_plan(&mut self, mut plan: TaskPlan) -> Result<ExecutionReport, EngineError> {
        if plan.status.is_terminal() {
            return Err(EngineError::PlanFinished(plan.id.clone()));
        }

        let started = Instant::now();
        let mut monitor = ProgressMonitor::new(plan.tasks.len(), self.cfg.progress_bar);
        plan.status = PlanStatus::InProgress;
        self.current_plan = Some(plan.clone());

        self.run_plan(&mut plan, &mut monitor).await;
        monitor.finish(plan.status == PlanStatus::Completed);

        let report = ExecutionReport::from_plan(&plan, started.elapsed());
        tracing::info!(
            plan_id = %plan.id,
            status = ?plan.status,
            completed = report.completed_tasks,
            total = report.total_tasks,
            "plan finished"
        );

        if self.cfg.write_reports {
            let dir = self.project_path.join(&self.cfg.reports_dir);
            match save_report(&dir, &report) {
                Ok(path) => tracing::debug!(path = %path.display(), "execution report written"),
                Err(e) => tracing::warn!(error = %e, "failed to persist execution report"),
            }
        }

        self.current_plan = Some(plan.clone());
        self.execution_history.push(plan);
        Ok(report)
    }

    async fn run_plan(&self, plan: &mut TaskPlan, monitor: &mut ProgressMonitor) {
        let deadline = Instant::now() + Duration::from_secs(self.cfg.max_execution_time_secs);

        while plan.current_task_index < plan.tasks.len() {
            if Instant::now() >= deadline {
                tracing::warn!(plan_id = %plan.id, "wall-clock budget exhausted");
                break;
            }

            let idx = plan.current_task_index;
            let (task_id, description) = {
                let task = &plan.tasks[idx];
                (task.id.clone(), task.description.clone())
            };
            monitor.start_task(&task_id, &description);

            let success = self.execute_single_task(&mut plan.tasks[idx]).await;
            plan.total_attempts += 1;

            if success {
                let task = &mut plan.tasks[idx];
                task.status = TaskStatus::Completed;
                task.completed_at = Some(chrono::Utc::now());
                monitor.complete_task(&task_id, true);
                plan.current_task_index += 1;
                self.pause(self.cfg.task_pause_ms).await;
                continue;
            }

            let retry_budget = plan.tasks[idx].max_attempts.min(self.cfg.max_attempts);
            if plan.tasks[idx].attempts < retry_budget {
                let failure = plan.tasks[idx].error.clone().unwrap_or_default();
                repair::repair_task(&mut plan.tasks[idx], &failure);
                tracing::info!(
                    task = %task_id,
                    attempt = plan.tasks[idx].attempts,
                    "retrying failed task"
                );
                self.pause(self.cfg.retry_pause_ms).await;
                continue;
            }

            plan.tasks[idx].status = TaskStatus::Failed;
            monitor.complete_task(&task_id, false);
            tracing::warn!(task = %task_id, "task exhausted its retry budget");
            break;
        }

        if plan.current_task_index >= plan.tasks.len() {
            self.final_validation().await;
            plan.status = PlanStatus::Completed;
        } else {
            plan.status = PlanStatus::Partial;
        }
    }

    /// One attempt: run the task's command, then its validation. The task
    /// completes only when both succeed (a missing command counts as
    /// success, validation alone decides).
    async fn execute_single_task(&self, task: &mut Task) -> bool {
        task.status = TaskStatus::InProgress;
        task.attempts += 1;

        let platform = Platform::current();

        if let Some(spec) = &task.command {
            let result = self.run_spec(spec, platform).await;
            if !result.success {
                task.error = Some(failure_text(&result));
                tracing::debug!(task = %task.id, error = ?task.error, "task command failed");
                return false;
            }
            task.result = Some(result.stdout);
        }

        if let Some(spec) = &task.validation {
            let result = self.run_spec(spec, platform).await;
            if !result.success {
                task.error = Some(format!("validation failed: {}", failure_text(&result)));
                tracing::debug!(task = %task.id, error = ?task.error, "task validation failed");
                return false;
            }
            if task.result.is_none() {
                task.result = Some(result.stdout);
            }
        }

        task.error = None;
        true
    }

    async fn run_spec(&self, spec: &CommandSpec, platform: Platform) -> CommandResult {
        let command = spec.resolve(platform);
        let ctx = CommandContext::new(&self.project_path)
            .with_timeout(Duration::from_secs(self.cfg.task_timeout_secs));
        self.runner.run(&command, &ctx).await
    }

    /// Informational end-of-plan checks. Failures are logged, never fatal:
    /// the plan already ran to completion when this is reached.
    async fn final_validation(&self) {
        let platform = Platform::current();
        let checks = [
            CommandSpec::PrintMessage {
                message: "Python syntax OK".to_string(),
            },
            CommandSpec::ListDirectory,
            CommandSpec::ImportSmokeTest,
        ];

        for check in &checks {
            let result = self.run_spec(check, platform).await;
            if result.success {
                tracing::debug!(command = %result.command, "final check passed");
            } else {
                tracing::warn!(
                    command = %result.command,
                    exit_code = result.exit_code,
                    "final check failed"
                );
            }
        }
    }

    async fn pause(&self, millis: u64) {
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    pub fn execution_status(&self) -> ExecutionStatus {
        let (plan_id, index, total, running) = match &self.current_plan {
            Some(plan) => (
                Some(plan.id.clone()),
                plan.current_task_index,
                plan.tasks.len(),
                !plan.status.is_terminal(),
            ),
            None => (None, 0, 0, false),
        };
        ExecutionStatus {
            running,
            current_plan_id: plan_id,
            current_task_index: index,
            total_tasks: total,
            plans_executed: self.execution_history.len(),
        }
    }

    pub fn current_plan(&self) -> Option<&TaskPlan> {
        self.current_plan.as_ref()
    }

    pub fn history(&self) -> &[TaskPlan] {
        &self.execution_history
    }
}

fn failure_text(result: &CommandResult) -> String {
    if !result.stderr.is_empty() {
        result.stderr.clone()
    } else if !result.stdout.is_empty() {
        result.stdout.clone()
    } else {
        format!("exit code {}", result.exit_code)
    }
}
