//! Core logic for autoexec: an autonomous command execution engine.
//!
//! A free-text instruction is broken into an ordered [`task::TaskPlan`] by the
//! [`planner::TaskPlanner`], then driven to completion by the
//! [`engine::AutonomousExecutor`]. Every shell command flows through the same
//! [`runner::ProcessRunner`]; ad-hoc one-shot execution additionally passes the
//! [`safety::SafetyClassifier`] gate inside the [`executor::CommandExecutor`].

pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod planner;
pub mod runner;
pub mod safety;
pub mod task;

pub use engine::{AutonomousExecutor, ExecutionReport};
pub use executor::CommandExecutor;
pub use runner::{CommandContext, CommandResult, ProcessRunner};
pub use safety::{SafetyAdvisor, SafetyClassifier};
pub use task::{CommandSpec, Platform, Task, TaskPlan};
