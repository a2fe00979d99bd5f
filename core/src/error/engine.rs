use thiserror::Error;

/// Engine-level errors for plan execution bookkeeping.
///
/// The plan loop itself never raises for task failures; those end up in
/// `Task.error` and the plan status. These variants cover the programmer /
/// environment errors around the loop.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("plan {0} is already finished and cannot be executed again")]
    PlanFinished(String),

    #[error("execution report serialization failed: {0}")]
    ReportSerialize(#[from] serde_json::Error),

    #[error("execution report write failed: {0}")]
    ReportWrite(#[from] std::io::Error),
}
