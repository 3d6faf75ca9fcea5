//! Test utilities and fixtures for judgebox integration tests.
//!
//! - [`scripts`] - sample submissions covering each verdict path
//! - [`temp_dir`] - create unique temporary directories
//! - [`fake_runner_config`] - a standard-tier config that executes `judgebox-fake-runner`
//! - [`write_config`] - serialize a config to a JSON file for CLI testing
//!
//! # Example
//!
//! ```ignore
//! use judgebox_fixtures::{fake_runner_config, scripts, temp_dir};
//!
//! let dir = temp_dir("runner");
//! let config = fake_runner_config(env!("CARGO_BIN_EXE_judgebox-fake-runner"), &dir);
//! let verdict = judgebox::run::judge_once(config, store, &request)?;
//! ```

// Test fixtures crate - relaxed lints for test utilities
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

pub mod helpers;
pub mod scripts;

pub use helpers::{fake_runner_config, temp_dir, write_config};
