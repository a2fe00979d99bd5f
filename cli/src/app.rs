use std::path::PathBuf;
use std::time::Duration;

use autoexec_core::config::AppConfig;
use autoexec_core::error::CoreError;
use autoexec_core::runner::{CommandContext, EXIT_BLOCKED};
use autoexec_core::task::PlanStatus;
use autoexec_core::{AutonomousExecutor, CommandExecutor, SafetyClassifier};

use crate::commands::cli::{ExecArgs, RunArgs};

/// Plan and execute one instruction; the report is printed as JSON.
pub async fn run_instruction(args: RunArgs, cfg: &AppConfig) -> Result<i32, CoreError> {
    let mut engine_cfg = cfg.engine.clone();
    if args.no_report {
        engine_cfg.write_reports = false;
    }
    if args.progress {
        engine_cfg.progress_bar = true;
    }

    let mut engine = AutonomousExecutor::new(PathBuf::from(&args.project_path), engine_cfg);
    let report = engine.execute_natural_command(&args.instruction).await;

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| CoreError::Anyhow(anyhow::Error::new(e)))?;
    println!("{json}");

    Ok(if report.status == PlanStatus::Completed {
        0
    } else {
        1
    })
}

/// One-shot command execution behind the safety gate. The child's exit
/// code becomes ours; a safety denial maps to the policy exit code.
pub async fn exec_command(args: ExecArgs, cfg: &AppConfig) -> Result<i32, CoreError> {
    let classifier = SafetyClassifier::new(cfg.safety.clone());
    let executor = CommandExecutor::new(classifier, &cfg.executor);

    let mut ctx = match &args.working_dir {
        Some(dir) => CommandContext::new(dir),
        None => CommandContext::default(),
    };
    if let Some(secs) = args.timeout {
        ctx = ctx.with_timeout(Duration::from_secs(secs));
    }
    if args.no_safe {
        ctx = ctx.unsafe_mode();
    }
    for pair in &args.env {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(CoreError::Config(format!(
                "invalid --env value {pair:?}, expected KEY=VALUE"
            )));
        };
        ctx = ctx.with_env(key, value);
    }

    let result = executor.execute_command(&args.command, &ctx).await;
    if !result.stdout.is_empty() {
        println!("{}", result.stdout);
    }
    if !result.stderr.is_empty() {
        eprintln!("{}", result.stderr);
    }

    Ok(match result.exit_code {
        0 => 0,
        EXIT_BLOCKED => 40,
        code if (1..256).contains(&code) => code,
        _ => 1,
    })
}
