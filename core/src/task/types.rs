use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::command::CommandSpec;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_MAX_TOTAL_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Pending,
    InProgress,
    Completed,
    /// Halted before all tasks were consumed (retry budget or wall clock).
    Partial,
    Failed,
}

impl PlanStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Partial | Self::Failed)
    }
}

/// One retryable unit of work: an optional command plus an optional
/// validation command whose success decides completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub description: String,
    /// `None` means a validation-only task (or a command resolved later by
    /// the engine's repair step).
    pub command: Option<CommandSpec>,
    pub validation: Option<CommandSpec>,
    pub status: TaskStatus,
    pub attempts: u32,
    pub max_attempts: u32,
    /// Last captured stdout.
    pub result: Option<String>,
    /// Last failure reason.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        command: Option<CommandSpec>,
        validation: Option<CommandSpec>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            command,
            validation,
            status: TaskStatus::Pending,
            attempts: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            result: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// Ordered task sequence derived from one natural-language instruction.
/// Insertion order is execution order; the plan is mutated in place by the
/// engine and becomes immutable once its status reaches a terminal value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPlan {
    pub id: String,
    /// The original instruction.
    pub description: String,
    pub tasks: Vec<Task>,
    pub status: PlanStatus,
    /// Cursor into `tasks`; everything before it is completed.
    pub current_task_index: usize,
    /// Total execution attempts across all tasks (reporting counter).
    pub total_attempts: u32,
    pub max_total_attempts: u32,
    pub created_at: DateTime<Utc>,
}

impl TaskPlan {
    pub fn new(description: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            id: format!("plan_{}", Uuid::new_v4()),
            description: description.into(),
            tasks,
            status: PlanStatus::Pending,
            current_task_index: 0,
            total_attempts: 0,
            max_total_attempts: DEFAULT_MAX_TOTAL_ATTEMPTS,
            created_at: Utc::now(),
        }
    }

    pub fn completed_tasks(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count()
    }

    pub fn failed_tasks(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Failed)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());

        assert!(PlanStatus::Partial.is_terminal());
        assert!(!PlanStatus::InProgress.is_terminal());
    }

    #[test]
    fn new_task_defaults() {
        let task = Task::new("task_1", "do something", None, None);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.attempts, 0);
        assert_eq!(task.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn plan_counts() {
        let mut plan = TaskPlan::new(
            "demo",
            vec![
                Task::new("a", "a", None, None),
                Task::new("b", "b", None, None),
            ],
        );
        plan.tasks[0].status = TaskStatus::Completed;
        plan.tasks[1].status = TaskStatus::Failed;
        assert_eq!(plan.completed_tasks(), 1);
        assert_eq!(plan.failed_tasks(), 1);
    }
}
