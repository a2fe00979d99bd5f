use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default autoexec data directory: ~/.autoexec
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".autoexec"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.autoexec/config.toml (highest)
    let data_dir = get_data_dir()?;
    let user_config = data_dir.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let mut cfg: AppConfig = if user_config.exists() {
        let s = std::fs::read_to_string(&user_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else if local_config.exists() {
        let s = std::fs::read_to_string(local_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else {
        AppConfig::default()
    };

    // Default log directory lives under the data dir.
    if cfg
        .logging
        .directory
        .as_deref()
        .map(str::trim)
        .map_or(true, str::is_empty)
    {
        let logs_dir = data_dir.join("logs");
        std::fs::create_dir_all(&logs_dir)?;
        cfg.logging.directory = Some(logs_dir.to_string_lossy().to_string());
    }

    // Environment variable overrides (Priority 0: highest)
    if let Ok(v) = std::env::var("AUTOEXEC_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.logging.level = v;
        }
    }
    if let Ok(v) = std::env::var("AUTOEXEC_REPORTS_DIR") {
        if !v.trim().is_empty() {
            cfg.engine.reports_dir = v;
        }
    }

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.engine.task_timeout_secs, 10);
        assert_eq!(cfg.engine.max_execution_time_secs, 3600);
        assert_eq!(cfg.engine.max_attempts, 3);
        assert_eq!(cfg.safety.max_plain_length, 50);
        assert_eq!(cfg.executor.history_limit, 100);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [engine]
            task_timeout_secs = 2
            task_pause_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.engine.task_timeout_secs, 2);
        assert_eq!(cfg.engine.task_pause_ms, 0);
        assert_eq!(cfg.engine.max_attempts, 3);
        assert!(cfg.logging.enabled);
    }
}
