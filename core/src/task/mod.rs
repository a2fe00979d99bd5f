pub mod command;
pub mod types;

pub use command::{CommandSpec, Platform};
pub use types::{PlanStatus, Task, TaskPlan, TaskStatus};
