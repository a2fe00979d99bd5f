use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub safety: SafetyConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "autoexec_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// Knobs for the safety classifier. The classifier is a best-effort gate,
/// not a sandbox; these only tune when the advisor escalation kicks in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Commands longer than this are escalated to the advisor even when no
    /// deny rule matched.
    #[serde(default = "default_max_plain_length")]
    pub max_plain_length: usize,
}

fn default_max_plain_length() -> usize {
    50
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            max_plain_length: default_max_plain_length(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Most-recent-last command history kept in memory.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Poll window for interactive stdout chunks, in milliseconds.
    #[serde(default = "default_interactive_poll_ms")]
    pub interactive_poll_ms: u64,
}

fn default_history_limit() -> usize {
    100
}

fn default_interactive_poll_ms() -> u64 {
    100
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            interactive_poll_ms: default_interactive_poll_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Wall-clock ceiling for one whole plan, in seconds.
    #[serde(default = "default_max_execution_time_secs")]
    pub max_execution_time_secs: u64,

    /// Hard timeout for each task command, in seconds.
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,

    /// Pause between tasks, in milliseconds.
    #[serde(default = "default_task_pause_ms")]
    pub task_pause_ms: u64,

    /// Pause before retrying a failed task, in milliseconds.
    #[serde(default = "default_retry_pause_ms")]
    pub retry_pause_ms: u64,

    /// Per-task retry budget.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Report directory relative to the project path.
    #[serde(default = "default_reports_dir")]
    pub reports_dir: String,

    /// Persist JSON execution reports (best-effort).
    #[serde(default = "default_write_reports")]
    pub write_reports: bool,

    /// Show an indicatif progress bar while a plan runs.
    #[serde(default)]
    pub progress_bar: bool,
}

fn default_max_execution_time_secs() -> u64 {
    3600
}

fn default_task_timeout_secs() -> u64 {
    10
}

fn default_task_pause_ms() -> u64 {
    1000
}

fn default_retry_pause_ms() -> u64 {
    2000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_reports_dir() -> String {
    ".autoexec/execution_reports".to_string()
}

fn default_write_reports() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_execution_time_secs: default_max_execution_time_secs(),
            task_timeout_secs: default_task_timeout_secs(),
            task_pause_ms: default_task_pause_ms(),
            retry_pause_ms: default_retry_pause_ms(),
            max_attempts: default_max_attempts(),
            reports_dir: default_reports_dir(),
            write_reports: default_write_reports(),
            progress_bar: false,
        }
    }
}
