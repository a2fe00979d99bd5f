//! Turns one free-text instruction into an ordered [`TaskPlan`].

mod rules;

use crate::task::{CommandSpec, Task, TaskPlan};

use rules::{
    RuleKind, DIRECTORY_WORDS, FILE_WORDS, FUNCTION_WORDS, MEMORY_WORDS, NAME_MARKERS, RULES,
};

/// Every plan ends with a task whose description starts with this marker.
pub const FINAL_VALIDATION_MARKER: &str = "Final validation";

const GENERIC_DIRECTORY_NAME: &str = "nova_pasta";

#[derive(Debug, Default)]
pub struct TaskPlanner;

impl TaskPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Keyword-match the instruction against the fixed rule table and
    /// assemble the plan. An instruction matching nothing still yields a
    /// validation-only plan (safe fallback, preserved behavior).
    pub fn parse(&self, instruction: &str) -> TaskPlan {
        let lowered = instruction.to_lowercase();
        let mut tasks: Vec<Task> = Vec::new();

        for rule in RULES {
            if !rule.matches(&lowered) {
                continue;
            }
            match rule.kind {
                RuleKind::Verification => tasks.push(Task::new(
                    task_id(tasks.len()),
                    "Verify files and detect problems",
                    Some(CommandSpec::SyntaxCheck),
                    Some(CommandSpec::ListDirectory),
                )),
                RuleKind::Fix => tasks.push(Task::new(
                    task_id(tasks.len()),
                    "Fix detected problems",
                    // Resolved dynamically by the engine's repair step.
                    None,
                    Some(CommandSpec::SyntaxCheck),
                )),
                RuleKind::Creation => {
                    if let Some(task) = creation_task(&lowered, tasks.len()) {
                        tasks.push(task);
                    }
                }
                RuleKind::FinalValidation => {
                    tasks.push(final_validation_task(task_id(tasks.len())));
                }
            }
        }

        // Every plan ends with a final validation step; the engine uses it
        // as its completion signal.
        if !tasks
            .iter()
            .any(|t| t.description.starts_with(FINAL_VALIDATION_MARKER))
        {
            tasks.push(final_validation_task("final_check".to_string()));
        }

        tracing::debug!(
            instruction,
            task_count = tasks.len(),
            "instruction parsed into plan"
        );
        TaskPlan::new(instruction, tasks)
    }
}

fn task_id(index: usize) -> String {
    format!("task_{}", index + 1)
}

fn final_validation_task(id: String) -> Task {
    Task::new(
        id,
        format!("{FINAL_VALIDATION_MARKER} - ensure everything works"),
        Some(CommandSpec::PrintMessage {
            message: "Final validation - system fully functional".to_string(),
        }),
        Some(CommandSpec::Echo {
            message: "Validation successful".to_string(),
        }),
    )
}

/// The creation rule branches on the object being created. An unrecognized
/// object produces no task (the final-validation fallback still applies).
fn creation_task(lowered: &str, index: usize) -> Option<Task> {
    if FUNCTION_WORDS.iter().any(|w| lowered.contains(w)) {
        return Some(Task::new(
            task_id(index),
            "Create requested function",
            None,
            Some(CommandSpec::PrintMessage {
                message: "Function created".to_string(),
            }),
        ));
    }

    if DIRECTORY_WORDS.iter().any(|w| lowered.contains(w)) {
        let name = extract_name(lowered).unwrap_or_else(|| GENERIC_DIRECTORY_NAME.to_string());
        return Some(Task::new(
            task_id(index),
            format!("Create directory '{name}'"),
            Some(CommandSpec::CreateDirectory { name }),
            Some(CommandSpec::ListDirectory),
        ));
    }

    if FILE_WORDS.iter().any(|w| lowered.contains(w)) {
        if MEMORY_WORDS.iter().any(|w| lowered.contains(w)) {
            return Some(Task::new(
                task_id(index),
                "Create memories file",
                Some(CommandSpec::CreateMemoriesFile),
                Some(CommandSpec::ListDirectoryOf {
                    path: "memories".to_string(),
                }),
            ));
        }
        return Some(Task::new(
            task_id(index),
            "Create requested file",
            Some(CommandSpec::CreateGeneralFile),
            Some(CommandSpec::ListDirectory),
        ));
    }

    None
}

/// Pick up an explicit name following "chamada"/"named"/"called".
fn extract_name(lowered: &str) -> Option<String> {
    let words: Vec<&str> = lowered.split_whitespace().collect();
    for (i, word) in words.iter().enumerate() {
        if NAME_MARKERS.contains(word) {
            let name: String = words
                .get(i + 1)?
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
                .collect();
            if !name.is_empty() {
                return Some(name);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskStatus;
    use pretty_assertions::assert_eq;

    #[test]
    fn rule_table_order_wins_over_word_order() {
        let planner = TaskPlanner::new();
        let plan = planner
            .parse("valida tudo, depois corrige os erros, verifica os arquivos e crie uma função");

        let descriptions: Vec<&str> = plan.tasks.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(
            descriptions,
            vec![
                "Verify files and detect problems",
                "Fix detected problems",
                "Create requested function",
                "Final validation - ensure everything works",
            ]
        );
    }

    #[test]
    fn unmatched_instruction_still_gets_final_validation() {
        let planner = TaskPlanner::new();
        let plan = planner.parse("bananas");
        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].id, "final_check");
        assert!(plan.tasks[0]
            .description
            .starts_with(FINAL_VALIDATION_MARKER));
    }

    #[test]
    fn every_plan_ends_with_final_validation() {
        let planner = TaskPlanner::new();
        for instruction in ["verify the build", "corrige os erros", "crie um arquivo"] {
            let plan = planner.parse(instruction);
            let last = plan.tasks.last().unwrap();
            assert!(
                last.description.starts_with(FINAL_VALIDATION_MARKER),
                "missing terminal validation for {instruction:?}"
            );
        }
    }

    #[test]
    fn directory_name_is_extracted() {
        let planner = TaskPlanner::new();
        let plan = planner.parse("Crie uma pasta chamada ideias");
        assert_eq!(
            plan.tasks[0].command,
            Some(CommandSpec::CreateDirectory {
                name: "ideias".to_string()
            })
        );
    }

    #[test]
    fn directory_name_falls_back_to_generic() {
        let planner = TaskPlanner::new();
        let plan = planner.parse("crie uma pasta");
        assert_eq!(
            plan.tasks[0].command,
            Some(CommandSpec::CreateDirectory {
                name: GENERIC_DIRECTORY_NAME.to_string()
            })
        );
    }

    #[test]
    fn memories_file_branch() {
        let planner = TaskPlanner::new();
        let plan = planner.parse("crie um arquivo para guardar memórias");
        assert_eq!(plan.tasks[0].command, Some(CommandSpec::CreateMemoriesFile));
        assert_eq!(
            plan.tasks[0].validation,
            Some(CommandSpec::ListDirectoryOf {
                path: "memories".to_string()
            })
        );
    }

    #[test]
    fn generic_file_branch() {
        let planner = TaskPlanner::new();
        let plan = planner.parse("gere um arquivo de notas");
        assert_eq!(plan.tasks[0].command, Some(CommandSpec::CreateGeneralFile));
    }

    #[test]
    fn fix_task_has_no_command() {
        let planner = TaskPlanner::new();
        let plan = planner.parse("corrige os problemas");
        assert_eq!(plan.tasks[0].command, None);
        assert_eq!(plan.tasks[0].validation, Some(CommandSpec::SyntaxCheck));
    }

    #[test]
    fn all_tasks_start_pending() {
        let planner = TaskPlanner::new();
        let plan = planner.parse("verifica e valida");
        assert!(plan
            .tasks
            .iter()
            .all(|t| t.status == TaskStatus::Pending && t.attempts == 0));
    }
}
