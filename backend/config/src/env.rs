//! Environment handling for config values.
//!
//! Two passes run at load time:
//! - `${VAR_NAME}` references inside string values are substituted
//!   (uppercase `[A-Z_][A-Z0-9_]*` names only; `$${VAR}` stays literal).
//! - Well-known variables (`OLLAMA_URL`, `SCRIBBLE_PORT`, ...) override
//!   whatever the file said.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

use crate::schema::ScribbleConfig;

/// Matches `${VAR}` and its escaped form `$${VAR}`.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references in a config value tree from the process env.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute env vars using a provided map.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => arr
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let var_name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{var_name}}}");
        }
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                if missing.is_none() {
                    missing = Some(MissingEnvVarError {
                        var_name: var_name.to_string(),
                        config_path: path.to_string(),
                    });
                }
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(substituted.into_owned())
}

/// Apply well-known env overrides from the process environment.
pub fn apply_env_overrides(config: ScribbleConfig) -> ScribbleConfig {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply well-known env overrides from a provided map.
pub fn apply_env_overrides_with(
    mut config: ScribbleConfig,
    env: &HashMap<String, String>,
) -> ScribbleConfig {
    let get = |key: &str| env.get(key).filter(|v| !v.trim().is_empty()).cloned();

    let ollama = config.ollama.get_or_insert_with(Default::default);
    if let Some(url) = get("OLLAMA_URL") {
        ollama.base_url = Some(url);
    }
    if let Some(model) = get("OLLAMA_MODEL") {
        ollama.model = Some(model);
    }
    if let Some(raw) = get("SCRIBBLE_TIMEOUT_SECS") {
        match raw.parse() {
            Ok(secs) => ollama.timeout_secs = Some(secs),
            Err(_) => warn!(value = %raw, "Ignoring unparsable SCRIBBLE_TIMEOUT_SECS"),
        }
    }

    let server = config.server.get_or_insert_with(Default::default);
    if let Some(bind) = get("SCRIBBLE_BIND") {
        server.bind = Some(bind);
    }
    if let Some(raw) = get("SCRIBBLE_PORT") {
        match raw.parse() {
            Ok(port) => server.port = Some(port),
            Err(_) => warn!(value = %raw, "Ignoring unparsable SCRIBBLE_PORT"),
        }
    }

    if let Some(level) = get("RUST_LOG") {
        config.logging.get_or_insert_with(Default::default).level = Some(level);
    }

    config
}
