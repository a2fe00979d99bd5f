use clap::Parser;

mod app;
mod commands;

use autoexec_core::config;
use autoexec_core::error::{CoreError, RunnerError};
use commands::cli;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CoreError> {
    let args = cli::Args::parse();
    let cfg = config::load_default().map_err(|e| CoreError::Config(e.to_string()))?;
    init_tracing(&cfg.logging).map_err(CoreError::Config)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "autoexec starting");

    match args.command {
        cli::Commands::Run(run_args) => {
            tracing::debug!(instruction = %run_args.instruction, "dispatching run");
            app::run_instruction(run_args, &cfg).await
        }
        cli::Commands::Exec(exec_args) => {
            tracing::debug!(command = %exec_args.command, "dispatching exec");
            app::exec_command(exec_args, &cfg).await
        }
    }
}

fn exit_code_for_error(e: &CoreError) -> i32 {
    // 0: success
    // 11: config error
    // 20: runner start / IO error
    // 40: policy deny (returned as a normal exit code, not as an error)
    // 50: internal/uncategorized
    match e {
        CoreError::Config(_) => 11,
        CoreError::Runner(re) => match re {
            RunnerError::Spawn(_) => 20,
            RunnerError::StreamIo { .. } => 20,
            RunnerError::Internal(_) => 50,
        },
        CoreError::Io(_) => 20,
        CoreError::Engine(_) => 50,
        CoreError::Anyhow(_) => 50,
    }
}

fn init_tracing(logging: &config::LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("autoexec"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("autoexec.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_map_to_11() {
        let e = CoreError::Config("bad toml".to_string());
        assert_eq!(exit_code_for_error(&e), 11);
    }

    #[test]
    fn spawn_errors_map_to_20() {
        let e = CoreError::Runner(RunnerError::Spawn("no such shell".to_string()));
        assert_eq!(exit_code_for_error(&e), 20);
    }

    #[test]
    fn run_args_parse() {
        let args = cli::Args::try_parse_from([
            "autoexec",
            "run",
            "Crie uma pasta chamada ideias",
            "--project-path",
            "/tmp/demo",
            "--no-report",
        ])
        .unwrap();
        let cli::Commands::Run(run) = args.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(run.instruction, "Crie uma pasta chamada ideias");
        assert_eq!(run.project_path, "/tmp/demo");
        assert!(run.no_report);
        assert!(!run.progress);
    }

    #[test]
    fn exec_args_parse() {
        let args = cli::Args::try_parse_from([
            "autoexec",
            "exec",
            "echo hi",
            "--timeout",
            "5",
            "--no-safe",
            "--env",
            "A=1",
            "--env",
            "B=2",
        ])
        .unwrap();
        let cli::Commands::Exec(exec) = args.command else {
            panic!("expected exec subcommand");
        };
        assert_eq!(exec.command, "echo hi");
        assert_eq!(exec.timeout, Some(5));
        assert!(exec.no_safe);
        assert_eq!(exec.env, vec!["A=1", "B=2"]);
    }
}
