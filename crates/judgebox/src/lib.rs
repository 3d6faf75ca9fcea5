//! judgebox: judging pipeline for student-authored browser-automation test scripts.
//!
//! A submitted script is materialized into an isolated workspace, then either executed by an
//! external test runner or, when no execution backend is reachable, checked by a lexical static
//! validator. Captured output is sanitized and the resulting verdict is recorded against the
//! submitting user and task.

#![forbid(unsafe_code)]
// Internal types are documented where the behavior is not obvious from the signature.
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod judge;
pub mod model;
pub mod recorder;
pub mod runner;
pub mod sanitize;
pub mod validator;
pub mod workspace;

pub use crate::error::{JudgeError, JudgeResult};
pub use crate::model::*;

pub mod run {
    use super::judge::Judge;
    use super::recorder::VerdictStore;
    use super::{AuthenticatedUser, ExecutionRequest, JudgeConfig, JudgeResult, Verdict};

    /// Build a judge from `config` and judge a single request.
    ///
    /// Convenience for one-shot callers; long-lived hosts should keep a [`Judge`] around.
    pub fn judge_once(
        config: JudgeConfig,
        store: Box<dyn VerdictStore>,
        request: &ExecutionRequest,
    ) -> JudgeResult<Verdict> {
        let judge = Judge::new(config, store)?;
        Ok(judge.judge(request))
    }

    /// Parse a wire request body and judge it on behalf of `user`.
    pub fn judge_body(
        config: JudgeConfig,
        store: Box<dyn VerdictStore>,
        user: &AuthenticatedUser,
        body: &str,
    ) -> JudgeResult<crate::JudgeResponse> {
        let judge = Judge::new(config, store)?;
        judge.handle(user, body)
    }
}
