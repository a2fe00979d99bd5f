use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::error::EngineError;
use crate::task::{PlanStatus, TaskPlan, TaskStatus};

/// Per-task slice of an [`ExecutionReport`].
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub id: String,
    pub description: String,
    pub status: TaskStatus,
    pub attempts: u32,
    pub result: Option<String>,
    pub error: Option<String>,
}

/// Summary of one finished plan, also what gets persisted as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub plan_id: String,
    pub original_command: String,
    pub status: PlanStatus,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
    /// completed / total, as a percentage.
    pub success_rate: f64,
    /// Wall-clock seconds for the whole plan.
    pub execution_time: f64,
    pub tasks_detail: Vec<TaskReport>,
}

impl ExecutionReport {
    pub fn from_plan(plan: &TaskPlan, elapsed: Duration) -> Self {
        let total = plan.tasks.len();
        let completed = plan.completed_tasks();
        let success_rate = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64 * 100.0
        };

        Self {
            plan_id: plan.id.clone(),
            original_command: plan.description.clone(),
            status: plan.status,
            total_tasks: total,
            completed_tasks: completed,
            failed_tasks: plan.failed_tasks(),
            success_rate,
            execution_time: elapsed.as_secs_f64(),
            tasks_detail: plan
                .tasks
                .iter()
                .map(|t| TaskReport {
                    id: t.id.clone(),
                    description: t.description.clone(),
                    status: t.status,
                    attempts: t.attempts,
                    result: t.result.clone(),
                    error: t.error.clone(),
                })
                .collect(),
        }
    }
}

/// Write the report as pretty JSON under `dir`, creating it if needed.
/// File names carry a timestamp so consecutive runs never clobber.
pub fn save_report(dir: &Path, report: &ExecutionReport) -> Result<PathBuf, EngineError> {
    std::fs::create_dir_all(dir)?;
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("execution_report_{stamp}.json"));
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, json)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;
    use pretty_assertions::assert_eq;

    #[test]
    fn success_rate_is_a_percentage() {
        let mut plan = TaskPlan::new(
            "demo",
            vec![
                Task::new("a", "a", None, None),
                Task::new("b", "b", None, None),
            ],
        );
        plan.tasks[0].status = TaskStatus::Completed;
        plan.status = PlanStatus::Partial;

        let report = ExecutionReport::from_plan(&plan, Duration::from_secs(2));
        assert_eq!(report.total_tasks, 2);
        assert_eq!(report.completed_tasks, 1);
        assert_eq!(report.success_rate, 50.0);
        assert_eq!(report.status, PlanStatus::Partial);
    }

    #[test]
    fn empty_plan_has_zero_rate() {
        let plan = TaskPlan::new("empty", vec![]);
        let report = ExecutionReport::from_plan(&plan, Duration::ZERO);
        assert_eq!(report.success_rate, 0.0);
    }

    #[test]
    fn report_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let plan = TaskPlan::new("demo", vec![Task::new("a", "a", None, None)]);
        let report = ExecutionReport::from_plan(&plan, Duration::from_millis(10));

        let path = save_report(dir.path(), &report).unwrap();
        let raw = std::fs::read_to_string(path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["plan_id"], report.plan_id);
        assert_eq!(parsed["total_tasks"], 1);
    }
}
