//! Error taxonomy for the judging pipeline.
//!
//! Only [`JudgeError::Protocol`], [`JudgeError::Config`] and [`JudgeError::Internal`] ever reach
//! a caller as a server fault. Workspace and process errors are folded into a failed verdict by
//! the judge, and persistence errors are logged and dropped by the recorder.

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::model::ErrorInfo;

pub type JudgeResult<T> = Result<T, JudgeError>;

/// Stable error codes shared by JSON payloads and CLI exit codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    Workspace,
    Process,
    Persistence,
    Protocol,
    Config,
    Io,
    Internal,
}

impl ErrorCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Workspace => "E_WORKSPACE",
            Self::Process => "E_PROCESS",
            Self::Persistence => "E_PERSISTENCE",
            Self::Protocol => "E_PROTOCOL",
            Self::Config => "E_CONFIG",
            Self::Io => "E_IO",
            Self::Internal => "E_INTERNAL",
        }
    }

    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "E_WORKSPACE" => Some(Self::Workspace),
            "E_PROCESS" => Some(Self::Process),
            "E_PERSISTENCE" => Some(Self::Persistence),
            "E_PROTOCOL" => Some(Self::Protocol),
            "E_CONFIG" => Some(Self::Config),
            "E_IO" => Some(Self::Io),
            "E_INTERNAL" => Some(Self::Internal),
            _ => None,
        }
    }

    /// Process exit code used by the CLI. `1` is reserved for a failed verdict.
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Config => 2,
            Self::Protocol => 3,
            Self::Workspace => 4,
            Self::Process => 5,
            Self::Persistence => 6,
            Self::Io => 7,
            Self::Internal => 10,
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum JudgeError {
    #[error("failed to create workspace: {message}")]
    #[diagnostic(
        code(judgebox::workspace),
        help("check that the workspace root exists and is writable")
    )]
    WorkspaceCreation {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("test runner failed: {message}")]
    #[diagnostic(code(judgebox::process))]
    ProcessExecution {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("failed to persist verdict: {message}")]
    #[diagnostic(code(judgebox::persistence))]
    Persistence { message: String },

    #[error("invalid request: {message}")]
    #[diagnostic(
        code(judgebox::protocol),
        help("requests look like {{\"code\": \"...\", \"taskId\": 1}}")
    )]
    Protocol {
        message: String,
        context: Option<Value>,
    },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(judgebox::config))]
    Config {
        message: String,
        context: Option<Value>,
    },

    #[error("{message}")]
    #[diagnostic(code(judgebox::io))]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("internal error: {message}")]
    #[diagnostic(code(judgebox::internal))]
    Internal { message: String },
}

impl JudgeError {
    pub fn workspace(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::WorkspaceCreation {
            message: message.into(),
            source,
        }
    }

    pub fn process(message: impl Into<String>, source: impl Into<Option<std::io::Error>>) -> Self {
        Self::ProcessExecution {
            message: message.into(),
            source: source.into(),
        }
    }

    pub fn persistence(message: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Persistence {
            message: format!("{}: {err}", message.into()),
        }
    }

    pub fn protocol(message: impl Into<String>, context: impl Into<Option<Value>>) -> Self {
        Self::Protocol {
            message: message.into(),
            context: context.into(),
        }
    }

    pub fn config(message: impl Into<String>, context: impl Into<Option<Value>>) -> Self {
        Self::Config {
            message: message.into(),
            context: context.into(),
        }
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::WorkspaceCreation { .. } => ErrorCode::Workspace,
            Self::ProcessExecution { .. } => ErrorCode::Process,
            Self::Persistence { .. } => ErrorCode::Persistence,
            Self::Protocol { .. } => ErrorCode::Protocol,
            Self::Config { .. } => ErrorCode::Config,
            Self::Io { .. } => ErrorCode::Io,
            Self::Internal { .. } => ErrorCode::Internal,
        }
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.error_code().exit_code()
    }

    #[must_use]
    pub fn to_error_info(&self) -> ErrorInfo {
        let context = match self {
            Self::Protocol { context, .. } | Self::Config { context, .. } => context.clone(),
            Self::WorkspaceCreation { source, .. } | Self::Io { source, .. } => {
                Some(serde_json::json!({ "source": source.to_string() }))
            }
            Self::ProcessExecution {
                source: Some(source),
                ..
            } => Some(serde_json::json!({ "source": source.to_string() })),
            _ => None,
        };
        ErrorInfo {
            code: self.error_code().as_str().to_string(),
            message: self.to_string(),
            context,
        }
    }
}
