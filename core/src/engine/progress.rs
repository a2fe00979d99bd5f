use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Visual progress for one running plan: an overall bar plus a spinner for
/// the task in flight. Fully inert when disabled so the engine can call it
/// unconditionally.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    current: Option<ProgressBar>,
    enabled: bool,
}

impl ProgressMonitor {
    pub fn new(total_tasks: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                multi: MultiProgress::new(),
                overall: ProgressBar::hidden(),
                current: None,
                enabled: false,
            };
        }

        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(total_tasks as u64));
        overall.set_style(
            ProgressStyle::default_bar()
                .template(
                    "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tasks ({percent}%) {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░  "),
        );
        overall.set_message("Starting...");

        Self {
            multi,
            overall,
            current: None,
            enabled: true,
        }
    }

    pub fn start_task(&mut self, task_id: &str, description: &str) {
        if !self.enabled {
            return;
        }

        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(format!("{task_id}: {description}"));
        bar.enable_steady_tick(Duration::from_millis(100));
        if let Some(previous) = self.current.replace(bar) {
            previous.finish_and_clear();
        }
    }

    pub fn complete_task(&mut self, task_id: &str, success: bool) {
        if !self.enabled {
            return;
        }

        if let Some(bar) = self.current.take() {
            let icon = if success { "ok" } else { "failed" };
            bar.finish_with_message(format!("{task_id}: {icon}"));
        }
        self.overall.inc(1);
    }

    pub fn finish(&self, success: bool) {
        if !self.enabled {
            return;
        }
        let msg = if success {
            "All tasks completed"
        } else {
            "Execution halted"
        };
        self.overall.finish_with_message(msg);
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        if let Some(bar) = self.current.take() {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_monitor_is_inert() {
        let mut monitor = ProgressMonitor::new(3, false);
        monitor.start_task("task_1", "demo");
        monitor.complete_task("task_1", true);
        monitor.finish(true);
    }

    #[test]
    fn enabled_monitor_tracks_tasks() {
        let mut monitor = ProgressMonitor::new(2, true);
        monitor.start_task("task_1", "first");
        monitor.complete_task("task_1", true);
        monitor.start_task("task_2", "second");
        monitor.complete_task("task_2", false);
        monitor.finish(false);
    }
}
