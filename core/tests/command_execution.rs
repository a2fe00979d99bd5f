//! End-to-end coverage of the command executor over real child processes.

use std::time::{Duration, Instant};

use autoexec_core::config::{ExecutorConfig, SafetyConfig};
use autoexec_core::runner::{CommandContext, EXIT_BLOCKED, EXIT_TIMEOUT};
use autoexec_core::{CommandExecutor, SafetyClassifier};

fn executor() -> CommandExecutor {
    CommandExecutor::new(
        SafetyClassifier::new(SafetyConfig::default()),
        &ExecutorConfig::default(),
    )
}

fn executor_with_history(limit: usize) -> CommandExecutor {
    let cfg = ExecutorConfig {
        history_limit: limit,
        ..ExecutorConfig::default()
    };
    CommandExecutor::new(SafetyClassifier::new(SafetyConfig::default()), &cfg)
}

#[tokio::test]
async fn timeout_is_reported_with_its_sentinel() {
    let exec = executor();
    let ctx = CommandContext::default().with_timeout(Duration::from_millis(300));

    let started = Instant::now();
    let result = exec.execute_command("sleep 5", &ctx).await;

    assert_eq!(result.exit_code, EXIT_TIMEOUT);
    assert!(!result.success);
    assert!(result.stderr.contains("timeout"));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn dangerous_command_is_blocked_before_spawn() {
    let exec = executor();
    let result = exec
        .execute_command("rm -rf /tmp/whatever", &CommandContext::default())
        .await;

    assert_eq!(result.exit_code, EXIT_BLOCKED);
    assert!(result.stderr.contains("blocked"));
    assert!(result.pid.is_none());
    // Blocked commands never reach the history.
    assert!(exec.history(10).is_empty());
}

#[tokio::test]
async fn unsafe_mode_skips_the_classifier_gate() {
    let exec = executor();
    let ctx = CommandContext::default().unsafe_mode();
    // Metacharacters would be escalated (and denied) in safe mode.
    let result = exec.execute_command("echo $(echo nested)", &ctx).await;
    assert!(result.success);
    assert_eq!(result.stdout, "nested");
}

#[tokio::test]
async fn batch_stops_at_first_failure_in_safe_mode() {
    let exec = executor();
    let commands = vec![
        "echo first".to_string(),
        "false".to_string(),
        "echo after".to_string(),
    ];

    let results = exec
        .execute_batch(&commands, &CommandContext::default())
        .await;
    assert_eq!(results.len(), 2);
    assert!(results[0].success);
    assert!(!results[1].success);

    let results = exec
        .execute_batch(&commands, &CommandContext::default().unsafe_mode())
        .await;
    assert_eq!(results.len(), 3);
    assert!(results[2].success);
    assert_eq!(results[2].stdout, "after");
}

#[tokio::test]
async fn parallel_results_preserve_input_order() {
    let exec = executor();
    let ctx = CommandContext::default().unsafe_mode();
    let commands = vec![
        "sleep 0.4 && echo slow".to_string(),
        "echo fast".to_string(),
        "sleep 0.2 && echo middle".to_string(),
    ];

    let results = exec.execute_parallel(&commands, &ctx).await;
    let outputs: Vec<&str> = results.iter().map(|r| r.stdout.as_str()).collect();
    assert_eq!(outputs, vec!["slow", "fast", "middle"]);
    assert!(results.iter().all(|r| r.success));
}

#[tokio::test]
async fn running_process_can_be_killed() {
    let exec = executor();
    let ctx = CommandContext::default();

    let task = {
        let exec = exec.clone();
        let ctx = ctx.clone();
        tokio::spawn(async move { exec.execute_command("sleep 10", &ctx).await })
    };

    // Wait for the child to appear in the registry.
    let mut pids = Vec::new();
    for _ in 0..50 {
        pids = exec.running_processes();
        if !pids.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(pids.len(), 1, "child never registered");
    assert!(exec.kill_process(pids[0]));

    let started = Instant::now();
    let result = task.await.unwrap();
    assert!(!result.success);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(exec.running_processes().is_empty());
}

#[tokio::test]
async fn history_is_bounded_and_ordered() {
    let exec = executor_with_history(2);
    let ctx = CommandContext::default();
    for cmd in ["echo one", "echo two", "echo three"] {
        exec.execute_command(cmd, &ctx).await;
    }

    let history = exec.history(10);
    let commands: Vec<&str> = history.iter().map(|r| r.command.as_str()).collect();
    assert_eq!(commands, vec!["echo two", "echo three"]);

    exec.clear_history();
    assert!(exec.history(10).is_empty());
}

#[tokio::test]
async fn interactive_prompt_gets_a_reply() {
    let exec = executor();
    let ctx = CommandContext::default().unsafe_mode();

    let result = exec
        .execute_interactive(
            "printf 'name: '; read n; echo \"hello $n\"",
            &ctx,
            |prompt| {
                if prompt.contains("name") {
                    Some("world".to_string())
                } else {
                    None
                }
            },
        )
        .await;

    assert!(result.success, "stderr: {}", result.stderr);
    assert!(result.stdout.contains("hello world"));
}
