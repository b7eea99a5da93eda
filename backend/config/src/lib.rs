//! Runtime configuration for Scribble.
//!
//! Provides:
//! - Typed config schema (backend, server, logging)
//! - YAML loading from `~/.scribble/config.yaml`
//! - `${ENV_VAR}` substitution and well-known env overrides
//! - Default value application
//! - Validation

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{
    apply_env_overrides, apply_env_overrides_with, resolve_env_vars, resolve_env_vars_with,
    MissingEnvVarError,
};
pub use io::{config_dir, config_file_path, load_config};
pub use schema::{LoggingConfig, OllamaConfig, ScribbleConfig, ServerConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Load, apply env substitution and overrides, apply defaults, and validate.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: &Path) -> Result<ScribbleConfig> {
    let raw_config = load_config(path).await?;

    let value = serde_json::to_value(&raw_config)
        .context("Failed to serialize config for processing")?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    let config: ScribbleConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_all_defaults(apply_env_overrides(config));

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.into_iter().next() {
        bail!(first);
    }

    Ok(config)
}

/// Load the config from the default location.
pub async fn load_default() -> Result<ScribbleConfig> {
    load_and_prepare(&config_file_path(&config_dir())).await
}
