//! CLI Guess Command
//!
//! Sends one image file to the backend and prints the outcome as JSON.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde_json::json;

use scribble_config::OllamaConfig;
use scribble_core::{GuessResult, Guesser, InferenceError};
use scribble_inference::{encode_image, OllamaGuesser};

use crate::terminal_output::{dim, note_error, note_success};

pub async fn run(config: &OllamaConfig, path: &Path, model: Option<String>) -> Result<ExitCode> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image: {}", path.display()))?;

    let mut guesser = OllamaGuesser::from_config(config);
    if let Some(model) = model {
        guesser = guesser.with_model(model);
    }

    let outcome = guesser.guess(&encode_image(&bytes)).await;
    println!("{}", render_outcome(&outcome)?);

    match outcome {
        Ok(result) => {
            note_success(&format!(
                "{} {}",
                result.guess,
                dim(&format!("({} confidence, {} ms)", result.confidence, result.duration))
            ));
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            note_error(&err.to_string());
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Same JSON shapes the HTTP API returns.
fn render_outcome(outcome: &Result<GuessResult, InferenceError>) -> Result<String> {
    let value = match outcome {
        Ok(result) => serde_json::to_value(result)?,
        Err(err) => json!({ "error": err.message, "code": err.kind.code() }),
    };
    Ok(serde_json::to_string_pretty(&value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribble_core::Confidence;

    #[test]
    fn renders_success() {
        let outcome = Ok(GuessResult {
            guess: "cat".into(),
            confidence: Confidence::High,
            duration: 900,
        });
        let value: serde_json::Value = serde_json::from_str(&render_outcome(&outcome).unwrap()).unwrap();
        assert_eq!(value, json!({ "guess": "cat", "confidence": "high", "duration": 900 }));
    }

    #[test]
    fn renders_failure() {
        let outcome = Err(InferenceError::network("connection refused"));
        let value: serde_json::Value = serde_json::from_str(&render_outcome(&outcome).unwrap()).unwrap();
        assert_eq!(value, json!({ "error": "connection refused", "code": "NETWORK_ERROR" }));
    }
}
