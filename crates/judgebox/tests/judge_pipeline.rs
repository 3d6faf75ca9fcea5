// Test module - relaxed lint rules
#![allow(clippy::indexing_slicing)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(missing_docs)]

//! End-to-end judging with the static validator and injected runners.

use judgebox::judge::{Backend, Judge, STATUS_OK, STATUS_SERVER_FAULT};
use judgebox::model::config::{DeploymentTier, JudgeConfigBuilder, RetentionPolicy};
use judgebox::recorder::{MemoryVerdictStore, VerdictStore};
use judgebox::runner::{CancellationToken, TestRunner};
use judgebox::workspace::Workspace;
use judgebox::{
    AuthenticatedUser, ExecutionOutcome, ExecutionRequest, JudgeConfig, JudgeError,
    JudgeResult, TaskId, UserId, VerdictRecord, VerdictStatus,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const VALID_SCRIPT: &str =
    "test('x', async ({page}) => { await page.goto('url'); await expect(page).toHaveTitle('t'); });";
const MISSPELLED_CLICK: &str =
    "test('x', async ({page}) => { await page.goto('url'); await page.locator('#go').clickk(); });";
const UNBALANCED_BRACE: &str = "test('x', async ({page}) => {\n  await page.goto('url');\n";

struct FixedRunner(ExecutionOutcome);

impl TestRunner for FixedRunner {
    fn run(&self, _workspace: &Workspace) -> ExecutionOutcome {
        self.0.clone()
    }
}

/// Records the workspace it was handed and what it found inside.
#[derive(Default)]
struct InspectingRunner {
    seen: Mutex<Vec<(PathBuf, String)>>,
}

impl TestRunner for InspectingRunner {
    fn run(&self, workspace: &Workspace) -> ExecutionOutcome {
        let source = fs::read_to_string(&workspace.source_path).unwrap_or_default();
        self.seen
            .lock()
            .unwrap()
            .push((workspace.dir.clone(), source));
        ExecutionOutcome::Ran {
            exit_success: true,
            raw_output: "1 passed".to_string(),
        }
    }
}

struct Shared(Arc<InspectingRunner>);

impl TestRunner for Shared {
    fn run(&self, workspace: &Workspace) -> ExecutionOutcome {
        self.0.run(workspace)
    }
}

struct FailingStore;

impl VerdictStore for FailingStore {
    fn insert(&self, _record: &VerdictRecord) -> JudgeResult<()> {
        Err(JudgeError::persistence("insert verdict", "connection refused"))
    }
}

fn static_config(root: &Path) -> JudgeConfig {
    JudgeConfigBuilder::new()
        .workspace_root(root.to_path_buf())
        .retention(RetentionPolicy::Remove)
        .build()
}

fn request(source: &str) -> ExecutionRequest {
    ExecutionRequest::new(source, TaskId(11), UserId(5))
}

fn static_judge(root: &Path) -> (Judge, Arc<MemoryVerdictStore>) {
    let store = Arc::new(MemoryVerdictStore::new());
    let judge = Judge::new(static_config(root), Box::new(Arc::clone(&store))).unwrap();
    (judge, store)
}

// =============================================================================
// Backend selection
// =============================================================================

#[test]
fn constrained_tier_without_endpoint_uses_static_validator() {
    let root = tempfile::tempdir().unwrap();
    let (judge, _) = static_judge(root.path());
    assert_eq!(judge.backend(), Backend::StaticValidator);
}

#[test]
fn endpoint_or_standard_tier_selects_runner() {
    let root = tempfile::tempdir().unwrap();
    let with_endpoint = JudgeConfigBuilder::new()
        .workspace_root(root.path().to_path_buf())
        .endpoint("ws://browsers:3000/")
        .build();
    let judge = Judge::new(with_endpoint, Box::new(MemoryVerdictStore::new())).unwrap();
    assert_eq!(judge.backend(), Backend::Runner);

    let standard = JudgeConfigBuilder::new()
        .workspace_root(root.path().to_path_buf())
        .tier(DeploymentTier::Standard)
        .build();
    let judge = Judge::new(standard, Box::new(MemoryVerdictStore::new())).unwrap();
    assert_eq!(judge.backend(), Backend::Runner);
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    let config = JudgeConfigBuilder::new().timeout_ms(0).build();
    assert!(Judge::new(config, Box::new(MemoryVerdictStore::new())).is_err());
}

// =============================================================================
// Verdicts
// =============================================================================

#[test]
fn valid_script_passes_without_a_runner() {
    let root = tempfile::tempdir().unwrap();
    let (judge, store) = static_judge(root.path());
    let verdict = judge.judge(&request(VALID_SCRIPT));

    assert_eq!(verdict.status, VerdictStatus::Passed);
    assert!(verdict.sanitized_log.contains("Simulated run"));
    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, VerdictStatus::Passed);
    assert_eq!(records[0].task_id, TaskId(11));
    assert_eq!(records[0].user_id, UserId(5));
}

#[test]
fn misspelled_method_fails_naming_the_suggestion() {
    let root = tempfile::tempdir().unwrap();
    let (judge, _) = static_judge(root.path());
    let verdict = judge.judge(&request(MISSPELLED_CLICK));

    assert_eq!(verdict.status, VerdictStatus::Failed);
    assert!(verdict.sanitized_log.contains("Unknown method \"clickk\""));
    assert!(verdict.sanitized_log.contains("\"click\""));
}

#[test]
fn unbalanced_brace_fails_with_syntax_error() {
    let root = tempfile::tempdir().unwrap();
    let (judge, _) = static_judge(root.path());
    let verdict = judge.judge(&request(UNBALANCED_BRACE));

    assert_eq!(verdict.status, VerdictStatus::Failed);
    assert!(verdict.sanitized_log.contains("SyntaxError"));
}

#[test]
fn runner_output_is_sanitized_before_recording() {
    let root = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryVerdictStore::new());
    let runner = FixedRunner(ExecutionOutcome::Ran {
        exit_success: true,
        raw_output: "\u{1b}[32mPASS\u{1b}[0m".to_string(),
    });
    let judge = Judge::with_runner(
        static_config(root.path()),
        Box::new(runner),
        Box::new(Arc::clone(&store)),
    )
    .unwrap();

    let verdict = judge.judge(&request(VALID_SCRIPT));
    assert_eq!(verdict.status, VerdictStatus::Passed);
    assert_eq!(verdict.sanitized_log, "PASS");
    assert_eq!(store.records()[0].log, "PASS");
}

// =============================================================================
// Failure policy
// =============================================================================

#[test]
fn failing_store_does_not_change_the_response() {
    let root = tempfile::tempdir().unwrap();
    let user = AuthenticatedUser::new(5);
    let body = serde_json::json!({ "code": MISSPELLED_CLICK, "taskId": 11 }).to_string();

    let (healthy, _) = static_judge(root.path());
    let broken = Judge::new(static_config(root.path()), Box::new(FailingStore)).unwrap();

    let expected = healthy.handle(&user, &body).unwrap();
    let actual = broken.handle(&user, &body).unwrap();
    assert_eq!(actual, expected);
    assert_eq!(broken.respond(&user, &body), healthy.respond(&user, &body));
}

#[test]
fn nonzero_exit_and_errored_runs_are_failed_verdicts() {
    let root = tempfile::tempdir().unwrap();
    for outcome in [
        ExecutionOutcome::Ran {
            exit_success: false,
            raw_output: "1 failed".to_string(),
        },
        ExecutionOutcome::Errored {
            message: "failed to start runner".to_string(),
        },
    ] {
        let judge = Judge::with_runner(
            static_config(root.path()),
            Box::new(FixedRunner(outcome.clone())),
            Box::new(MemoryVerdictStore::new()),
        )
        .unwrap();
        let verdict = judge.judge(&request(VALID_SCRIPT));
        assert_eq!(verdict.status, VerdictStatus::Failed);
        assert_eq!(verdict.sanitized_log, outcome.text());
    }
}

#[test]
fn workspace_failure_is_a_recorded_failed_verdict() {
    let scratch = tempfile::tempdir().unwrap();
    let blocker = scratch.path().join("occupied");
    fs::write(&blocker, "not a directory").unwrap();
    let (judge, store) = static_judge(&blocker);

    let verdict = judge.judge(&request(VALID_SCRIPT));
    assert_eq!(verdict.status, VerdictStatus::Failed);
    assert!(verdict.sanitized_log.contains("failed to create workspace"));
    assert_eq!(store.records().len(), 1);
}

#[test]
fn malformed_requests_answer_server_fault() {
    let root = tempfile::tempdir().unwrap();
    let (judge, store) = static_judge(root.path());
    let user = AuthenticatedUser::new(1);

    for body in ["not json", r#"{"code": "x"}"#, r#"{"code": 1, "taskId": 2}"#] {
        let (status, reply) = judge.respond(&user, body);
        assert_eq!(status, STATUS_SERVER_FAULT, "{body}");
        assert_eq!(reply["error"], "E_PROTOCOL");
        assert!(reply["message"].as_str().is_some());
    }
    assert!(store.records().is_empty());
}

#[test]
fn judged_failure_answers_ok() {
    let root = tempfile::tempdir().unwrap();
    let (judge, _) = static_judge(root.path());
    let body = serde_json::json!({ "code": UNBALANCED_BRACE, "taskId": 2 }).to_string();

    let (status, reply) = judge.respond(&AuthenticatedUser::new(1), &body);
    assert_eq!(status, STATUS_OK);
    assert_eq!(reply["status"], "failed");
    assert!(reply["logs"].as_str().unwrap().contains("SyntaxError"));
}

#[cfg(unix)]
#[test]
fn cancelled_judge_refuses_later_requests_without_recording_them() {
    let root = tempfile::tempdir().unwrap();
    let config = JudgeConfigBuilder::new()
        .workspace_root(root.path().to_path_buf())
        .retention(RetentionPolicy::Remove)
        .tier(DeploymentTier::Standard)
        .runner_command("true", Vec::new())
        .build();
    let store = Arc::new(MemoryVerdictStore::new());
    let token = CancellationToken::new();
    let judge =
        Judge::with_cancellation(config, Box::new(Arc::clone(&store)), token.clone()).unwrap();

    assert_eq!(judge.judge(&request(VALID_SCRIPT)).status, VerdictStatus::Passed);
    token.cancel();
    assert!(judge.is_shutting_down());

    let refused = judge.judge(&request(VALID_SCRIPT));
    assert_eq!(refused.status, VerdictStatus::Failed);
    assert!(refused.sanitized_log.contains("shutting down"));

    let body = serde_json::json!({ "code": VALID_SCRIPT, "taskId": 3 }).to_string();
    let (status, reply) = judge.respond(&AuthenticatedUser::new(1), &body);
    assert_eq!(status, STATUS_SERVER_FAULT);
    assert_eq!(reply["error"], "E_INTERNAL");

    assert_eq!(store.records().len(), 1);
    assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
}

// =============================================================================
// Workspaces
// =============================================================================

#[test]
fn runner_sees_source_in_its_own_workspace_which_is_then_removed() {
    let root = tempfile::tempdir().unwrap();
    let runner = Arc::new(InspectingRunner::default());

    let judge = Judge::with_runner(
        static_config(root.path()),
        Box::new(Shared(Arc::clone(&runner))),
        Box::new(MemoryVerdictStore::new()),
    )
    .unwrap();
    judge.judge(&request("first"));
    judge.judge(&request("second"));

    let seen = runner.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert_ne!(seen[0].0, seen[1].0);
    assert_eq!(seen[0].1, "first");
    assert_eq!(seen[1].1, "second");
    assert!(!seen[0].0.exists());
    assert!(!seen[1].0.exists());
}

#[test]
fn concurrent_requests_are_judged_independently() {
    let root = tempfile::tempdir().unwrap();
    let (judge, store) = static_judge(root.path());
    let judge = Arc::new(judge);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let judge = Arc::clone(&judge);
            std::thread::spawn(move || {
                let source = if i % 2 == 0 { VALID_SCRIPT } else { MISSPELLED_CLICK };
                judge.judge(&request(source)).status
            })
        })
        .collect();
    let statuses: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for (i, status) in statuses.iter().enumerate() {
        let expected = if i % 2 == 0 {
            VerdictStatus::Passed
        } else {
            VerdictStatus::Failed
        };
        assert_eq!(*status, expected);
    }
    assert_eq!(store.records().len(), 16);
}
