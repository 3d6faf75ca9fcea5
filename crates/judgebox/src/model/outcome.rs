use crate::model::{ExecutionId, TaskId, UserId};
use crate::sanitize::sanitize;
use serde::{Deserialize, Serialize};

/// What the chosen execution path produced, before sanitization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// The external runner ran to completion.
    Ran {
        exit_success: bool,
        raw_output: String,
    },
    /// The static validator judged the source without executing it.
    SimulatedRan { valid: bool, diagnostic: String },
    /// Nothing could be judged: the workspace or the runner process failed.
    Errored { message: String },
}

impl ExecutionOutcome {
    #[must_use]
    pub fn passed(&self) -> bool {
        match self {
            Self::Ran { exit_success, .. } => *exit_success,
            Self::SimulatedRan { valid, .. } => *valid,
            Self::Errored { .. } => false,
        }
    }

    /// Unsanitized text carried by the outcome.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Ran { raw_output, .. } => raw_output,
            Self::SimulatedRan { diagnostic, .. } => diagnostic,
            Self::Errored { message } => message,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ran { .. } => "ran",
            Self::SimulatedRan { .. } => "simulated",
            Self::Errored { .. } => "errored",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Passed,
    Failed,
}

impl VerdictStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final binary outcome of a submission. The log is always sanitized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub sanitized_log: String,
    pub duration_ms: u64,
}

impl Verdict {
    /// Collapse an outcome into a verdict, sanitizing its text.
    ///
    /// This is the only place captured text is sanitized.
    #[must_use]
    pub fn from_outcome(outcome: &ExecutionOutcome, duration_ms: u64) -> Self {
        let status = if outcome.passed() {
            VerdictStatus::Passed
        } else {
            VerdictStatus::Failed
        };
        Self {
            status,
            sanitized_log: sanitize(outcome.text()),
            duration_ms,
        }
    }

    #[must_use]
    pub fn to_response(&self) -> crate::model::JudgeResponse {
        crate::model::JudgeResponse {
            logs: self.sanitized_log.clone(),
            status: self.status,
        }
    }
}

/// Row written by the result recorder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictRecord {
    pub execution_id: ExecutionId,
    pub user_id: UserId,
    pub task_id: TaskId,
    pub status: VerdictStatus,
    pub log: String,
    pub duration_ms: u64,
    pub recorded_at_ms: u64,
}
