// Test module - relaxed lint rules
#![cfg(unix)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(missing_docs)]

//! Process runner against real `/bin/sh` children.

use judgebox::model::config::{JudgeConfig, JudgeConfigBuilder, RetentionPolicy};
use judgebox::runner::{CancellationToken, ProcessRunner, TestRunner};
use judgebox::workspace::{Workspace, WorkspaceAllocator};
use judgebox::{ExecutionId, ExecutionOutcome};
use std::path::Path;
use std::time::{Duration, Instant};

fn shell_config(root: &Path, script: &str) -> JudgeConfigBuilder {
    JudgeConfigBuilder::new()
        .workspace_root(root.to_path_buf())
        .retention(RetentionPolicy::Keep)
        .runner_command("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

fn prepare(config: &JudgeConfig, source: &str) -> Workspace {
    WorkspaceAllocator::new(config)
        .allocate(ExecutionId::new(), source)
        .unwrap()
}

fn run(config: &JudgeConfig, source: &str) -> ExecutionOutcome {
    let workspace = prepare(config, source);
    ProcessRunner::new(config.runner.clone()).run(&workspace)
}

#[test]
fn zero_exit_is_a_successful_run() {
    let root = tempfile::tempdir().unwrap();
    let config = shell_config(root.path(), "printf '\\033[32mok\\033[0m\\n'").build();
    match run(&config, "test()") {
        ExecutionOutcome::Ran {
            exit_success,
            raw_output,
        } => {
            assert!(exit_success);
            assert!(raw_output.contains("ok"));
            assert!(raw_output.contains('\u{1b}'));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn nonzero_exit_keeps_stderr() {
    let root = tempfile::tempdir().unwrap();
    let config = shell_config(root.path(), "echo out; echo boom >&2; exit 3").build();
    match run(&config, "test()") {
        ExecutionOutcome::Ran {
            exit_success,
            raw_output,
        } => {
            assert!(!exit_success);
            assert!(raw_output.contains("out"));
            assert!(raw_output.contains("boom"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn placeholders_point_into_the_workspace() {
    let root = tempfile::tempdir().unwrap();
    let config = shell_config(root.path(), "cat {source}; pwd; test -f {config} && echo has-config").build();
    let workspace = prepare(&config, "page.goto('/')");
    let outcome = ProcessRunner::new(config.runner.clone()).run(&workspace);

    let text = outcome.text();
    assert!(outcome.passed(), "{text}");
    assert!(text.contains("page.goto('/')"));
    assert!(text.contains("has-config"));
    let dir_name = workspace.dir.file_name().unwrap().to_string_lossy().to_string();
    assert!(text.contains(&dir_name));
}

#[test]
fn runner_environment_is_pinned() {
    let root = tempfile::tempdir().unwrap();
    let config = shell_config(
        root.path(),
        "echo \"ci=$CI endpoint=$PW_TEST_CONNECT_WS_ENDPOINT extra=$JUDGE_EXTRA\"",
    )
    .endpoint("ws://browsers:3000/")
    .runner_env("JUDGE_EXTRA", "42")
    .build();
    let outcome = run(&config, "test()");
    assert!(outcome
        .text()
        .contains("ci=1 endpoint=ws://browsers:3000/ extra=42"));
}

#[test]
fn timeout_stops_the_process_group() {
    let root = tempfile::tempdir().unwrap();
    let config = shell_config(root.path(), "echo started; sleep 30")
        .timeout_ms(300)
        .kill_grace_ms(200)
        .build();
    let started = Instant::now();
    let outcome = run(&config, "test()");

    assert!(started.elapsed() < Duration::from_secs(10));
    match outcome {
        ExecutionOutcome::Errored { message } => {
            assert!(message.contains("started"));
            assert!(message.contains("timed out after 300 ms"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn sigterm_ignoring_child_is_killed_after_grace() {
    let root = tempfile::tempdir().unwrap();
    let config = shell_config(root.path(), "trap '' TERM; sleep 30")
        .timeout_ms(200)
        .kill_grace_ms(200)
        .build();
    let started = Instant::now();
    let outcome = run(&config, "test()");

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(matches!(outcome, ExecutionOutcome::Errored { .. }));
}

#[test]
fn cancellation_stops_a_running_child() {
    let root = tempfile::tempdir().unwrap();
    let config = shell_config(root.path(), "sleep 30").timeout_ms(60_000).build();
    let workspace = prepare(&config, "test()");
    let token = CancellationToken::new();
    let runner = ProcessRunner::new(config.runner.clone()).with_cancellation(token.clone());

    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(200));
        token.cancel();
    });
    let started = Instant::now();
    let outcome = runner.run(&workspace);
    canceller.join().unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(outcome.text().contains("cancelled"));
    assert!(!outcome.passed());
}

#[test]
fn output_beyond_budget_is_truncated() {
    let root = tempfile::tempdir().unwrap();
    let config = shell_config(root.path(), "head -c 5000 /dev/zero | tr '\\000' 'a'")
        .max_output_bytes(100)
        .build();
    let outcome = run(&config, "test()");
    let text = outcome.text();

    assert!(text.starts_with(&"a".repeat(100)));
    assert!(text.ends_with("[output truncated after 100 bytes]"));
    assert!(!text.contains(&"a".repeat(101)));
}

#[test]
fn missing_runner_binary_is_errored() {
    let root = tempfile::tempdir().unwrap();
    let config = JudgeConfigBuilder::new()
        .workspace_root(root.path().to_path_buf())
        .runner_command("/nonexistent/playwright", Vec::new())
        .build();
    let outcome = run(&config, "test()");
    assert!(matches!(outcome, ExecutionOutcome::Errored { .. }));
    assert!(outcome.text().contains("/nonexistent/playwright"));
}
