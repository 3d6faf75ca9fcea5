//! Loading and validation of [`JudgeConfig`] files.

use crate::error::{JudgeError, JudgeResult};
use crate::model::config::{JudgeConfig, RetentionPolicy, StoreConfig, CONFIG_VERSION};
use std::fs;
use std::path::Path;

/// Load a configuration file. `.yaml`/`.yml` files are parsed as YAML, anything else as JSON.
pub fn load_config_file(path: &Path) -> JudgeResult<JudgeConfig> {
    let data = fs::read_to_string(path)
        .map_err(|err| JudgeError::io(format!("failed to read config {}", path.display()), err))?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == "yaml" || ext == "yml");
    let config: JudgeConfig = if is_yaml {
        serde_yml::from_str(&data).map_err(|err| {
            JudgeError::config(
                "failed to parse yaml config",
                serde_json::json!({ "path": path.display().to_string(), "parse_error": err.to_string() }),
            )
        })?
    } else {
        serde_json::from_str(&data).map_err(|err| {
            JudgeError::config(
                "failed to parse json config",
                serde_json::json!({ "path": path.display().to_string(), "parse_error": err.to_string() }),
            )
        })?
    };
    validate_config(&config)?;
    Ok(config)
}

/// Reject configurations the judge cannot run with.
pub fn validate_config(config: &JudgeConfig) -> JudgeResult<()> {
    if config.config_version != CONFIG_VERSION {
        return Err(JudgeError::config(
            "unsupported config version",
            serde_json::json!({
                "provided_version": config.config_version,
                "supported_version": CONFIG_VERSION
            }),
        ));
    }

    if let Some(root) = config.workspace.root.as_ref() {
        if !root.is_absolute() {
            return Err(JudgeError::config(
                "workspace root must be an absolute path",
                serde_json::json!({ "root": root.display().to_string() }),
            ));
        }
    }

    if let RetentionPolicy::Ttl { ttl_ms } = config.workspace.retention {
        let minimum = config.min_retention_ttl_ms();
        if ttl_ms < minimum {
            return Err(JudgeError::config(
                "retention ttl must outlast the longest possible run",
                serde_json::json!({
                    "ttl_ms": ttl_ms,
                    "minimum_ttl_ms": minimum,
                    "fix": "raise ttl_ms, lower runner.timeout_ms, or use {\"kind\": \"remove\"} to delete workspaces immediately"
                }),
            ));
        }
    }

    let runner = &config.runner;
    if config.uses_runner() && runner.command.trim().is_empty() {
        return Err(JudgeError::config("runner command is empty", None));
    }
    if runner.timeout_ms == 0 {
        return Err(JudgeError::config(
            "runner timeout must be greater than zero",
            serde_json::json!({ "timeout_ms": runner.timeout_ms }),
        ));
    }
    if runner.max_output_bytes == 0 {
        return Err(JudgeError::config(
            "runner output budget must be greater than zero",
            None,
        ));
    }
    if let Some(endpoint) = runner.endpoint.as_deref() {
        if !is_supported_endpoint(endpoint) {
            return Err(JudgeError::config(
                "runner endpoint must be a ws://, wss://, http:// or https:// url",
                serde_json::json!({ "endpoint": endpoint }),
            ));
        }
    }

    if let StoreConfig::Jsonl { path: Some(path) } = &config.store {
        if path.as_os_str().is_empty() {
            return Err(JudgeError::config("jsonl store path is empty", None));
        }
    }

    Ok(())
}

fn is_supported_endpoint(endpoint: &str) -> bool {
    ["ws://", "wss://", "http://", "https://"]
        .iter()
        .any(|scheme| endpoint.starts_with(scheme) && endpoint.len() > scheme.len())
}
