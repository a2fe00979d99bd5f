//! Error-driven task repair between retries.
//!
//! A failed attempt's stderr is matched against a small set of known
//! failure classes. Only encoding failures actually rewrite the task (the
//! non-ASCII strip); the other classes are logged for diagnosis and the
//! task retries unchanged, so a persistent failure still exhausts its
//! budget and halts the plan.

use crate::task::{CommandSpec, Task};

/// Mutate `task` based on the failure text. Returns true if anything was
/// changed.
pub(super) fn repair_task(task: &mut Task, failure: &str) -> bool {
    let lowered = failure.to_lowercase();

    if lowered.contains("unicodeencodeerror") || lowered.contains("charmap") {
        if let Some(CommandSpec::Literal { command }) = task.command.as_mut() {
            let before = command.len();
            command.retain(|c| c.is_ascii());
            if command.len() != before {
                tracing::info!(task = %task.id, "stripped non-ascii characters before retry");
                return true;
            }
        }
        return false;
    }

    if lowered.contains("permission denied") {
        tracing::info!(task = %task.id, "permission failure, retrying unchanged");
    } else if lowered.contains("not found") || lowered.contains("no such file") {
        tracing::info!(task = %task.id, "target missing, retrying unchanged");
    } else if lowered.contains("syntax error") || lowered.contains("syntaxerror") {
        tracing::info!(task = %task.id, "syntax failure, retrying unchanged");
    }

    false
}
