use crate::model::{TaskId, UserId, VerdictStatus};
use serde::{Deserialize, Serialize};

/// Identity handed over by the authentication gate. The judge never verifies it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: UserId,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self { id: UserId(id) }
    }
}

/// Wire request body: `{ "code": "...", "taskId": 1 }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JudgeRequest {
    pub code: String,
    pub task_id: TaskId,
}

/// An accepted submission. Fields are private so the request stays immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionRequest {
    source: String,
    task_id: TaskId,
    user_id: UserId,
}

impl ExecutionRequest {
    #[must_use]
    pub fn new(source: impl Into<String>, task_id: TaskId, user_id: UserId) -> Self {
        Self {
            source: source.into(),
            task_id,
            user_id,
        }
    }

    #[must_use]
    pub fn from_wire(request: JudgeRequest, user: &AuthenticatedUser) -> Self {
        Self::new(request.code, request.task_id, user.id)
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

/// Wire response for a judged submission, passed or failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeResponse {
    pub logs: String,
    pub status: VerdictStatus,
}

/// Wire response for a server fault: `{ "error": "E_PROTOCOL", "message": "..." }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Structured error payload used by JSON output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    pub context: Option<serde_json::Value>,
}

impl From<ErrorInfo> for ErrorResponse {
    fn from(info: ErrorInfo) -> Self {
        Self {
            error: info.code,
            message: info.message,
        }
    }
}
