//! Verdict persistence.
//!
//! Stores implement [`VerdictStore`]. [`ResultRecorder`] wraps a store and turns every storage
//! failure into a log line, so a broken store never changes what the caller receives.

use crate::error::{JudgeError, JudgeResult};
use crate::model::config::{JudgeConfig, StoreConfig};
use crate::model::{ExecutionId, TaskId, UserId, Verdict, VerdictRecord};
use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Durable destination for verdict records.
pub trait VerdictStore: Send + Sync {
    /// Persist one record.
    ///
    /// # Errors
    /// - `E_PERSISTENCE`: the record could not be stored
    fn insert(&self, record: &VerdictRecord) -> JudgeResult<()>;
}

/// Records kept by [`MemoryVerdictStore::new`] before the oldest are dropped.
pub const DEFAULT_MEMORY_CAPACITY: usize = 10_000;

/// Build the store described by `config.store`.
///
/// # Errors
/// - `E_PERSISTENCE`: the JSONL file cannot be opened
pub fn open_store(config: &JudgeConfig) -> JudgeResult<Box<dyn VerdictStore>> {
    if let Some(path) = config.store_path() {
        return Ok(Box::new(JsonlVerdictStore::open(&path)?));
    }
    Ok(match config.store {
        StoreConfig::Memory => Box::new(MemoryVerdictStore::new()),
        StoreConfig::Jsonl { .. } | StoreConfig::Disabled => Box::new(DisabledStore),
    })
}

/// Appends one JSON object per line.
#[derive(Debug)]
pub struct JsonlVerdictStore {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlVerdictStore {
    /// Open (or create) `path` for appending, creating parent directories.
    ///
    /// # Errors
    /// - `E_PERSISTENCE`: the file or its parent directory cannot be created
    pub fn open(path: &Path) -> JudgeResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                JudgeError::persistence(format!("cannot create {}", parent.display()), err)
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| {
                JudgeError::persistence(format!("cannot open {}", path.display()), err)
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VerdictStore for JsonlVerdictStore {
    fn insert(&self, record: &VerdictRecord) -> JudgeResult<()> {
        let mut line = serde_json::to_string(record)
            .map_err(|err| JudgeError::persistence("cannot serialize verdict record", err))?;
        line.push('\n');
        let mut file = self
            .file
            .lock()
            .map_err(|_| JudgeError::persistence("verdict store lock poisoned", "poisoned"))?;
        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|err| {
                JudgeError::persistence(format!("cannot append to {}", self.path.display()), err)
            })
    }
}

/// Keeps the most recent records in memory; mostly useful for tests.
#[derive(Debug)]
pub struct MemoryVerdictStore {
    capacity: usize,
    records: Mutex<VecDeque<VerdictRecord>>,
}

impl Default for MemoryVerdictStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_CAPACITY)
    }
}

impl MemoryVerdictStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` records (at least one), dropping the oldest first.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: Mutex::new(VecDeque::new()),
        }
    }

    /// Snapshot of everything stored so far.
    #[must_use]
    pub fn records(&self) -> Vec<VerdictRecord> {
        self.records
            .lock()
            .map(|records| records.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl VerdictStore for MemoryVerdictStore {
    fn insert(&self, record: &VerdictRecord) -> JudgeResult<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| JudgeError::persistence("verdict store lock poisoned", "poisoned"))?;
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record.clone());
        Ok(())
    }
}

impl<S: VerdictStore + ?Sized> VerdictStore for std::sync::Arc<S> {
    fn insert(&self, record: &VerdictRecord) -> JudgeResult<()> {
        (**self).insert(record)
    }
}

/// Accepts and drops every record.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledStore;

impl VerdictStore for DisabledStore {
    fn insert(&self, _record: &VerdictRecord) -> JudgeResult<()> {
        Ok(())
    }
}

/// Records verdicts without ever failing the request.
pub struct ResultRecorder {
    store: Box<dyn VerdictStore>,
}

impl std::fmt::Debug for ResultRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultRecorder").finish_non_exhaustive()
    }
}

impl ResultRecorder {
    #[must_use]
    pub fn new(store: Box<dyn VerdictStore>) -> Self {
        Self { store }
    }

    /// Persist `verdict`. Returns whether the store accepted it.
    pub fn record(
        &self,
        execution_id: ExecutionId,
        user_id: UserId,
        task_id: TaskId,
        verdict: &Verdict,
    ) -> bool {
        let record = VerdictRecord {
            execution_id,
            user_id,
            task_id,
            status: verdict.status,
            log: verdict.sanitized_log.clone(),
            duration_ms: verdict.duration_ms,
            recorded_at_ms: now_ms(),
        };
        match self.store.insert(&record) {
            Ok(()) => {
                debug!(execution_id = %execution_id, "verdict recorded");
                true
            }
            Err(err) => {
                warn!(
                    execution_id = %execution_id,
                    user_id = %user_id,
                    task_id = %task_id,
                    error = %err,
                    "failed to record verdict"
                );
                false
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
