use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Current configuration format version.
pub const CONFIG_VERSION: u32 = 1;

/// Default retention for ephemeral workspaces: one day.
pub const DEFAULT_RETENTION_TTL_MS: u64 = 24 * 60 * 60 * 1000;

/// Time a workspace may stay untouched beyond the runner timeout and kill grace while its run
/// is still being collected (allocation, pipe draining, recording).
pub const RETENTION_SLACK_MS: u64 = 1_000;

// =============================================================================
// Workspace
// =============================================================================

/// How workspaces are laid out on disk.
///
/// - `Ephemeral`: one fresh directory per request, named after its execution id
/// - `Persistent`: a single fixed directory reused by every request, for inspection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceMode {
    #[default]
    Ephemeral,
    Persistent,
}

/// What happens to an ephemeral workspace once its verdict exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Never delete; workspaces stay for inspection.
    Keep,
    /// Delete as soon as the verdict is built.
    Remove,
    /// Keep, but sweep workspaces older than `ttl_ms`.
    Ttl { ttl_ms: u64 },
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::Ttl {
            ttl_ms: DEFAULT_RETENTION_TTL_MS,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Parent directory for all workspaces. Defaults to `<tmp>/judgebox`.
    pub root: Option<PathBuf>,
    pub mode: WorkspaceMode,
    pub retention: RetentionPolicy,
}

impl WorkspaceConfig {
    #[must_use]
    pub fn resolved_root(&self) -> PathBuf {
        self.root
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("judgebox"))
    }
}

// =============================================================================
// Runner
// =============================================================================

/// Deployment class. A `Constrained` deployment without an endpoint has no execution
/// backend and judges with the static validator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentTier {
    Standard,
    #[default]
    Constrained,
}

/// External runner invocation.
///
/// `args` may contain the placeholders `{config}`, `{source}` and `{dir}`, replaced with the
/// workspace's configuration file, source file and directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Remote browser endpoint (e.g. `ws://browsers:3000/`).
    pub endpoint: Option<String>,
    pub tier: DeploymentTier,
    pub command: String,
    pub args: Vec<String>,
    /// Hard limit on a single runner invocation.
    pub timeout_ms: u64,
    /// Time between SIGTERM and SIGKILL when a run is stopped.
    pub kill_grace_ms: u64,
    /// Captured output beyond this many bytes is dropped.
    pub max_output_bytes: u64,
    /// Extra environment variables for the runner process.
    pub env: BTreeMap<String, String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            tier: DeploymentTier::Constrained,
            command: "npx".to_string(),
            args: vec![
                "playwright".to_string(),
                "test".to_string(),
                "--config".to_string(),
                "{config}".to_string(),
                "{source}".to_string(),
            ],
            timeout_ms: 120_000,
            kill_grace_ms: 2_000,
            max_output_bytes: 1024 * 1024,
            env: BTreeMap::new(),
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// File name of the default JSONL store inside the workspace root.
pub const DEFAULT_STORE_FILE: &str = "verdicts.jsonl";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Append one JSON record per verdict to `path`, or to [`DEFAULT_STORE_FILE`] under the
    /// workspace root when no path is given.
    Jsonl {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
    },
    /// Keep the most recent verdicts in process memory.
    Memory,
    /// Drop verdicts.
    Disabled,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Jsonl { path: None }
    }
}

// =============================================================================
// JudgeConfig
// =============================================================================

/// Explicit configuration handed to the judge at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    pub config_version: u32,
    pub workspace: WorkspaceConfig,
    pub runner: RunnerConfig,
    pub store: StoreConfig,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            config_version: CONFIG_VERSION,
            workspace: WorkspaceConfig::default(),
            runner: RunnerConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl JudgeConfig {
    /// Where the JSONL store writes, if the store is JSONL.
    #[must_use]
    pub fn store_path(&self) -> Option<PathBuf> {
        match &self.store {
            StoreConfig::Jsonl { path: Some(path) } => Some(path.clone()),
            StoreConfig::Jsonl { path: None } => {
                Some(self.workspace.resolved_root().join(DEFAULT_STORE_FILE))
            }
            StoreConfig::Memory | StoreConfig::Disabled => None,
        }
    }

    /// Shortest retention TTL that can never expire a workspace whose run is still in flight.
    #[must_use]
    pub fn min_retention_ttl_ms(&self) -> u64 {
        self.runner
            .timeout_ms
            .saturating_add(self.runner.kill_grace_ms)
            .saturating_add(RETENTION_SLACK_MS)
    }

    /// Whether requests go to the external runner rather than the static validator.
    #[must_use]
    pub fn uses_runner(&self) -> bool {
        self.runner.endpoint.is_some() || self.runner.tier == DeploymentTier::Standard
    }
}

// =============================================================================
// JudgeConfigBuilder
// =============================================================================

/// Fluent builder for [`JudgeConfig`].
///
/// # Example
///
/// ```ignore
/// use judgebox::model::config::JudgeConfigBuilder;
///
/// let config = JudgeConfigBuilder::new()
///     .workspace_root("/srv/judgebox".into())
///     .endpoint("ws://browsers:3000/")
///     .timeout_ms(60_000)
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct JudgeConfigBuilder {
    config: JudgeConfig,
}

impl JudgeConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn workspace_root(mut self, root: PathBuf) -> Self {
        self.config.workspace.root = Some(root);
        self
    }

    #[must_use]
    pub fn ephemeral(mut self) -> Self {
        self.config.workspace.mode = WorkspaceMode::Ephemeral;
        self
    }

    /// Reuse one fixed workspace directory for every request.
    #[must_use]
    pub fn persistent(mut self) -> Self {
        self.config.workspace.mode = WorkspaceMode::Persistent;
        self
    }

    #[must_use]
    pub fn retention(mut self, retention: RetentionPolicy) -> Self {
        self.config.workspace.retention = retention;
        self
    }

    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.runner.endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn tier(mut self, tier: DeploymentTier) -> Self {
        self.config.runner.tier = tier;
        self
    }

    #[must_use]
    pub fn runner_command(mut self, command: impl Into<String>, args: Vec<String>) -> Self {
        self.config.runner.command = command.into();
        self.config.runner.args = args;
        self
    }

    #[must_use]
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.runner.timeout_ms = ms;
        self
    }

    #[must_use]
    pub fn kill_grace_ms(mut self, ms: u64) -> Self {
        self.config.runner.kill_grace_ms = ms;
        self
    }

    #[must_use]
    pub fn max_output_bytes(mut self, bytes: u64) -> Self {
        self.config.runner.max_output_bytes = bytes;
        self
    }

    #[must_use]
    pub fn runner_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.runner.env.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn store(mut self, store: StoreConfig) -> Self {
        self.config.store = store;
        self
    }

    /// Build the configuration. Use `judgebox::config::validate_config` before use.
    #[must_use]
    pub fn build(self) -> JudgeConfig {
        self.config
    }
}
