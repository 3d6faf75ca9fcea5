//! Orchestration: allocate a workspace, execute or validate, sanitize, record.
//!
//! A [`Judge`] is built once from an explicit [`JudgeConfig`] and can be shared between
//! threads; requests never share mutable state beyond the workspace root.

use crate::config::validate_config;
use crate::error::{JudgeError, JudgeResult};
use crate::model::config::{JudgeConfig, RetentionPolicy, DEFAULT_RETENTION_TTL_MS};
use crate::model::{
    AuthenticatedUser, ErrorResponse, ExecutionId, ExecutionOutcome, ExecutionRequest,
    JudgeRequest, JudgeResponse, Verdict, MAX_SOURCE_BYTES,
};
use crate::recorder::{ResultRecorder, VerdictStore};
use crate::runner::{CancellationToken, ProcessRunner, TestRunner};
use crate::validator::StaticValidator;
use crate::workspace::{SweepReport, WorkspaceAllocator};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// HTTP-equivalent status for a judged request, passed or failed.
pub const STATUS_OK: u16 = 200;
/// HTTP-equivalent status for malformed requests and internal faults.
pub const STATUS_SERVER_FAULT: u16 = 500;

const SHUTTING_DOWN: &str = "judge is shutting down; the submission was not run";

/// Which execution path a judge uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Runner,
    StaticValidator,
}

impl Backend {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Runner => "runner",
            Self::StaticValidator => "static",
        }
    }
}

pub struct Judge {
    config: JudgeConfig,
    allocator: WorkspaceAllocator,
    runner: Option<Box<dyn TestRunner>>,
    validator: StaticValidator,
    recorder: ResultRecorder,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Judge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Judge")
            .field("config", &self.config)
            .field("backend", &self.backend())
            .finish_non_exhaustive()
    }
}

impl Judge {
    /// Build a judge whose backend is chosen from `config`.
    ///
    /// # Errors
    /// - `E_CONFIG`: `config` fails validation
    pub fn new(config: JudgeConfig, store: Box<dyn VerdictStore>) -> JudgeResult<Self> {
        Self::with_cancellation(config, store, CancellationToken::new())
    }

    /// Like [`Judge::new`], stopping in-flight runner processes when `token` is cancelled.
    ///
    /// # Errors
    /// - `E_CONFIG`: `config` fails validation
    pub fn with_cancellation(
        config: JudgeConfig,
        store: Box<dyn VerdictStore>,
        token: CancellationToken,
    ) -> JudgeResult<Self> {
        validate_config(&config)?;
        let runner: Option<Box<dyn TestRunner>> = if config.uses_runner() {
            Some(Box::new(
                ProcessRunner::new(config.runner.clone()).with_cancellation(token.clone()),
            ))
        } else {
            None
        };
        Ok(Self::assemble(config, runner, store, token))
    }

    /// Build a judge that always executes through `runner`, whatever the tier.
    ///
    /// # Errors
    /// - `E_CONFIG`: `config` fails validation
    pub fn with_runner(
        config: JudgeConfig,
        runner: Box<dyn TestRunner>,
        store: Box<dyn VerdictStore>,
    ) -> JudgeResult<Self> {
        validate_config(&config)?;
        Ok(Self::assemble(
            config,
            Some(runner),
            store,
            CancellationToken::new(),
        ))
    }

    fn assemble(
        config: JudgeConfig,
        runner: Option<Box<dyn TestRunner>>,
        store: Box<dyn VerdictStore>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            allocator: WorkspaceAllocator::new(&config),
            config,
            runner,
            validator: StaticValidator::new(),
            recorder: ResultRecorder::new(store),
            cancel,
        }
    }

    #[must_use]
    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        if self.runner.is_some() {
            Backend::Runner
        } else {
            Backend::StaticValidator
        }
    }

    #[must_use]
    pub fn allocator(&self) -> &WorkspaceAllocator {
        &self.allocator
    }

    /// Token that stops in-flight runs. Once cancelled the judge accepts no further work.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Judge one request and record the verdict.
    ///
    /// After cancellation nothing is run or recorded; the returned verdict is a failure that
    /// says so.
    pub fn judge(&self, request: &ExecutionRequest) -> Verdict {
        if self.is_shutting_down() {
            warn!(
                task_id = %request.task_id(),
                user_id = %request.user_id(),
                "request refused, judge is shutting down"
            );
            let outcome = ExecutionOutcome::Errored {
                message: SHUTTING_DOWN.to_string(),
            };
            return Verdict::from_outcome(&outcome, 0);
        }
        let execution_id = ExecutionId::new();
        let started = Instant::now();
        let backend = self.backend();

        let (outcome, workspace) = match self.allocator.allocate(execution_id, request.source())
        {
            Ok(workspace) => {
                let outcome = match &self.runner {
                    Some(runner) => runner.run(&workspace),
                    None => self.validator.evaluate(request.source()),
                };
                (outcome, Some(workspace))
            }
            Err(err) => {
                warn!(
                    execution_id = %execution_id,
                    task_id = %request.task_id(),
                    user_id = %request.user_id(),
                    error = %err,
                    "workspace allocation failed"
                );
                let outcome = ExecutionOutcome::Errored {
                    message: err.to_string(),
                };
                (outcome, None)
            }
        };

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = started.elapsed().as_millis() as u64;
        let verdict = Verdict::from_outcome(&outcome, duration_ms);

        if let Some(workspace) = workspace.as_ref() {
            self.allocator.release(workspace);
        }
        self.recorder.record(
            execution_id,
            request.user_id(),
            request.task_id(),
            &verdict,
        );

        info!(
            execution_id = %execution_id,
            task_id = %request.task_id(),
            user_id = %request.user_id(),
            backend = backend.as_str(),
            outcome = outcome.kind(),
            status = %verdict.status,
            duration_ms,
            "submission judged"
        );
        verdict
    }

    /// Parse a wire request body and judge it on behalf of `user`.
    ///
    /// # Errors
    /// - `E_PROTOCOL`: the body is not a valid request or the code is too large
    /// - `E_INTERNAL`: the judge has been cancelled and accepts no further work
    pub fn handle(&self, user: &AuthenticatedUser, body: &str) -> JudgeResult<JudgeResponse> {
        if self.is_shutting_down() {
            return Err(JudgeError::internal(SHUTTING_DOWN));
        }
        let request = parse_request(body)?;
        let request = ExecutionRequest::from_wire(request, user);
        Ok(self.judge(&request).to_response())
    }

    /// Answer a wire request with an HTTP-equivalent status and JSON body.
    ///
    /// Judged submissions answer 200 whether they passed or failed; malformed requests and
    /// internal faults answer 500 with `{error, message}`.
    pub fn respond(&self, user: &AuthenticatedUser, body: &str) -> (u16, Value) {
        match self.handle(user, body) {
            Ok(response) => (
                STATUS_OK,
                json!({ "logs": response.logs, "status": response.status.as_str() }),
            ),
            Err(err) => {
                warn!(user_id = %user.id, error = %err, "request rejected");
                let response = ErrorResponse::from(err.to_error_info());
                (
                    STATUS_SERVER_FAULT,
                    json!({ "error": response.error, "message": response.message }),
                )
            }
        }
    }

    /// Delete expired ephemeral workspaces.
    ///
    /// Uses the configured TTL; `keep` and `remove` retention fall back to the default TTL.
    ///
    /// # Errors
    /// - `E_IO`: the workspace root cannot be listed
    pub fn sweep(&self) -> JudgeResult<SweepReport> {
        let ttl_ms = match self.config.workspace.retention {
            RetentionPolicy::Ttl { ttl_ms } => ttl_ms,
            RetentionPolicy::Keep | RetentionPolicy::Remove => DEFAULT_RETENTION_TTL_MS,
        };
        self.allocator.sweep_expired(Duration::from_millis(ttl_ms))
    }
}

/// Parse and bound-check a wire request body.
///
/// # Errors
/// - `E_PROTOCOL`: malformed JSON, unknown fields, or code larger than [`MAX_SOURCE_BYTES`]
pub fn parse_request(body: &str) -> JudgeResult<JudgeRequest> {
    let request: JudgeRequest = serde_json::from_str(body).map_err(|err| {
        JudgeError::protocol(
            "malformed request body",
            json!({ "parse_error": err.to_string() }),
        )
    })?;
    if request.code.len() > MAX_SOURCE_BYTES {
        return Err(JudgeError::protocol(
            format!("submitted code exceeds {MAX_SOURCE_BYTES} bytes"),
            json!({ "size": request.code.len() }),
        ));
    }
    Ok(request)
}
