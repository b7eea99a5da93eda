//! Config validation with user-friendly error messages.

use crate::schema::ScribbleConfig;
use thiserror::Error;

/// Longest deadline we accept without complaint; larger values are allowed
/// but warned about.
const MAX_SANE_TIMEOUT_SECS: u64 = 600;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &ScribbleConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_ollama(config, &mut report);
    validate_server(config, &mut report);
    report
}

fn validate_ollama(config: &ScribbleConfig, report: &mut ValidationReport) {
    let Some(ollama) = &config.ollama else { return };

    if let Some(url) = &ollama.base_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            report.error("ollama.baseUrl", format!("Must be an http(s) URL, got '{url}'"));
        }
    }
    if let Some(model) = &ollama.model {
        if model.trim().is_empty() {
            report.error("ollama.model", "Model name cannot be empty");
        }
    }
    match ollama.timeout_secs {
        Some(0) => report.error("ollama.timeoutSecs", "Timeout must be greater than zero"),
        Some(secs) if secs > MAX_SANE_TIMEOUT_SECS => report.warn(
            "ollama.timeoutSecs",
            format!("Timeout of {secs}s is unusually long; a hung backend will block callers that long"),
        ),
        _ => {}
    }
    if let Some(temperature) = ollama.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            report.error("ollama.temperature", "Temperature must be between 0.0 and 2.0");
        } else if temperature > 0.5 {
            report.warn(
                "ollama.temperature",
                "High temperature makes the two-line reply format less reliable",
            );
        }
    }
    if ollama.max_output_tokens == Some(0) {
        report.error("ollama.maxOutputTokens", "Must be greater than zero");
    }
}

fn validate_server(config: &ScribbleConfig, report: &mut ValidationReport) {
    let Some(server) = &config.server else { return };
    if server.port == Some(0) {
        report.warn("server.port", "Port 0 binds a random port");
    }
    if server.max_body_bytes == Some(0) {
        report.error("server.maxBodyBytes", "Must be greater than zero");
    }
}
