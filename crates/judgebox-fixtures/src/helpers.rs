//! Common test helper functions.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use judgebox::model::config::{DeploymentTier, JudgeConfig, JudgeConfigBuilder, RetentionPolicy};

/// Create a unique temporary directory for a test.
///
/// The name combines a timestamp with a process-wide counter, so parallel tests in one binary
/// never collide. The directory is created immediately.
///
/// # Panics
///
/// Panics if the directory cannot be created.
#[must_use]
pub fn temp_dir(prefix: &str) -> PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "judgebox-{prefix}-{}-{stamp}-{seq}",
        std::process::id()
    ));

    #[allow(clippy::expect_used)]
    fs::create_dir_all(&dir).expect("failed to create temp directory");

    dir
}

/// Standard-tier configuration that runs `binary` against the workspace source file.
///
/// Workspaces live under `dir/workspaces` and are removed after each verdict.
#[must_use]
pub fn fake_runner_config(binary: impl Into<String>, dir: &Path) -> JudgeConfig {
    JudgeConfigBuilder::new()
        .workspace_root(dir.join("workspaces"))
        .retention(RetentionPolicy::Remove)
        .tier(DeploymentTier::Standard)
        .runner_command(binary, vec!["{source}".to_string()])
        .timeout_ms(10_000)
        .kill_grace_ms(200)
        .build()
}

/// Write a config to a JSON file.
///
/// # Panics
///
/// Panics if serialization or file writing fails.
pub fn write_config(path: &Path, config: &JudgeConfig) {
    #[allow(clippy::expect_used)]
    let json = serde_json::to_string_pretty(config).expect("failed to serialize config");
    #[allow(clippy::expect_used)]
    fs::write(path, json).expect("failed to write config file");
}
