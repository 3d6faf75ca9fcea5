//! Per-request workspace allocation.
//!
//! Ephemeral workspaces live at `<root>/run-<execution id>` and are created with
//! `create_dir`, never `create_dir_all`, so two requests can never end up sharing one.
//! Persistent mode reuses `<root>/persistent` for single-operator inspection.

use crate::error::{JudgeError, JudgeResult};
use crate::model::config::{JudgeConfig, RetentionPolicy, WorkspaceMode};
use crate::model::ExecutionId;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info, warn};

/// File name of the submitted script inside a workspace.
pub const SOURCE_FILE_NAME: &str = "submission.spec.js";
/// File name of the generated runner configuration inside a workspace.
pub const CONFIG_FILE_NAME: &str = "playwright.config.js";
/// Directory name prefix for ephemeral workspaces.
pub const EPHEMERAL_PREFIX: &str = "run-";
/// Directory name used in persistent mode.
pub const PERSISTENT_DIR_NAME: &str = "persistent";

/// Minimum spacing between opportunistic sweeps triggered by allocation.
const AUTO_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Handle to an allocated workspace. Owned by exactly one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Workspace {
    pub execution_id: ExecutionId,
    pub mode: WorkspaceMode,
    pub dir: PathBuf,
    pub source_path: PathBuf,
    pub config_path: PathBuf,
}

/// Result of a retention sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub workspaces_checked: usize,
    pub workspaces_removed: usize,
    pub removed: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct WorkspaceAllocator {
    root: PathBuf,
    mode: WorkspaceMode,
    retention: RetentionPolicy,
    endpoint: Option<String>,
    last_sweep: Mutex<Option<Instant>>,
}

impl WorkspaceAllocator {
    #[must_use]
    pub fn new(config: &JudgeConfig) -> Self {
        Self {
            root: config.workspace.resolved_root(),
            mode: config.workspace.mode,
            retention: config.workspace.retention.clone(),
            endpoint: config.runner.endpoint.clone(),
            last_sweep: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn mode(&self) -> WorkspaceMode {
        self.mode
    }

    /// Create the workspace for `execution_id` and write `source` plus a run configuration.
    ///
    /// # Errors
    /// - `E_WORKSPACE`: the directory or one of its files could not be created
    pub fn allocate(&self, execution_id: ExecutionId, source: &str) -> JudgeResult<Workspace> {
        self.maybe_sweep();

        fs::create_dir_all(&self.root).map_err(|err| {
            JudgeError::workspace(
                format!("cannot create workspace root {}", self.root.display()),
                err,
            )
        })?;

        let dir = match self.mode {
            WorkspaceMode::Ephemeral => {
                let dir = self.root.join(format!("{EPHEMERAL_PREFIX}{execution_id}"));
                fs::create_dir(&dir).map_err(|err| {
                    JudgeError::workspace(format!("cannot create {}", dir.display()), err)
                })?;
                dir
            }
            WorkspaceMode::Persistent => {
                let dir = self.root.join(PERSISTENT_DIR_NAME);
                fs::create_dir_all(&dir).map_err(|err| {
                    JudgeError::workspace(format!("cannot create {}", dir.display()), err)
                })?;
                dir
            }
        };

        let source_path = dir.join(SOURCE_FILE_NAME);
        let config_path = dir.join(CONFIG_FILE_NAME);
        write_private(&source_path, source.as_bytes())?;
        let run_config = render_run_config(&dir, self.endpoint.as_deref(), execution_id);
        write_private(&config_path, run_config.as_bytes())?;

        debug!(
            execution_id = %execution_id,
            dir = %dir.display(),
            mode = ?self.mode,
            "workspace allocated"
        );

        Ok(Workspace {
            execution_id,
            mode: self.mode,
            dir,
            source_path,
            config_path,
        })
    }

    /// Apply the retention policy to a finished workspace.
    ///
    /// Persistent workspaces are never removed. Removal failures are logged, not returned.
    pub fn release(&self, workspace: &Workspace) {
        if workspace.mode == WorkspaceMode::Persistent {
            return;
        }
        if matches!(self.retention, RetentionPolicy::Remove) {
            if let Err(err) = fs::remove_dir_all(&workspace.dir) {
                warn!(
                    execution_id = %workspace.execution_id,
                    error = %err,
                    "failed to remove workspace"
                );
            }
        }
    }

    /// Delete ephemeral workspaces last modified more than `ttl` ago.
    ///
    /// # Errors
    /// - `E_IO`: the workspace root exists but cannot be listed
    pub fn sweep_expired(&self, ttl: Duration) -> JudgeResult<SweepReport> {
        let mut report = SweepReport::default();
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(report),
            Err(err) => {
                return Err(JudgeError::io(
                    format!("cannot list workspace root {}", self.root.display()),
                    err,
                ))
            }
        };
        let now = SystemTime::now();

        for entry in entries.flatten() {
            let name = entry.file_name();
            let is_ephemeral = name
                .to_str()
                .is_some_and(|name| name.starts_with(EPHEMERAL_PREFIX));
            if !is_ephemeral {
                continue;
            }
            report.workspaces_checked += 1;

            let age = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok());
            let Some(age) = age else {
                continue;
            };
            if age <= ttl {
                continue;
            }

            let path = entry.path();
            match fs::remove_dir_all(&path) {
                Ok(()) => {
                    report.workspaces_removed += 1;
                    report.removed.push(path);
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to sweep workspace");
                }
            }
        }

        if report.workspaces_removed > 0 {
            info!(
                checked = report.workspaces_checked,
                removed = report.workspaces_removed,
                "expired workspaces swept"
            );
        }
        Ok(report)
    }

    fn maybe_sweep(&self) {
        let RetentionPolicy::Ttl { ttl_ms } = self.retention else {
            return;
        };
        if self.mode == WorkspaceMode::Persistent {
            return;
        }
        {
            let Ok(mut last) = self.last_sweep.lock() else {
                return;
            };
            if last.is_some_and(|at| at.elapsed() < AUTO_SWEEP_INTERVAL) {
                return;
            }
            *last = Some(Instant::now());
        }
        if let Err(err) = self.sweep_expired(Duration::from_millis(ttl_ms)) {
            warn!(error = %err, "workspace sweep failed");
        }
    }
}

/// Render the runner configuration pinning working directory, target and headless mode.
#[must_use]
pub fn render_run_config(dir: &Path, endpoint: Option<&str>, execution_id: ExecutionId) -> String {
    let dir_literal = js_string(&dir.display().to_string());
    let source_literal = js_string(SOURCE_FILE_NAME);
    let mut use_block = String::from("    headless: true,\n");
    if let Some(endpoint) = endpoint {
        use_block.push_str(&format!(
            "    connectOptions: {{ wsEndpoint: {} }},\n",
            js_string(endpoint)
        ));
    }
    format!(
        "// Generated by judgebox for execution {execution_id}.\n\
         module.exports = {{\n  \
         testDir: {dir_literal},\n  \
         testMatch: {source_literal},\n  \
         outputDir: {output_literal},\n  \
         retries: 0,\n  \
         workers: 1,\n  \
         reporter: [[\"list\"]],\n  \
         use: {{\n{use_block}  }},\n\
         }};\n",
        output_literal = js_string(&dir.join("test-results").display().to_string()),
    )
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn write_private(path: &Path, contents: &[u8]) -> JudgeResult<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options
        .open(path)
        .map_err(|err| JudgeError::workspace(format!("cannot create {}", path.display()), err))?;
    file.write_all(contents)
        .map_err(|err| JudgeError::workspace(format!("cannot write {}", path.display()), err))?;
    Ok(())
}
