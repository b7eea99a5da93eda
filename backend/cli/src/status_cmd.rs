//! CLI Status Command
//!
//! Reports whether the configured vision model is installed on the backend.

use std::process::ExitCode;

use anyhow::Result;

use scribble_config::OllamaConfig;
use scribble_core::Guesser;
use scribble_inference::OllamaGuesser;

use crate::terminal_output::{dim, note_error, note_info, note_success, note_warn};

pub async fn run(config: &OllamaConfig) -> Result<ExitCode> {
    note_info(&format!("Backend: {}", config.base_url()));
    let guesser = OllamaGuesser::from_config(config);

    match guesser.check_model().await {
        Ok(status) => {
            println!("{}", serde_json::to_string_pretty(&status)?);
            if status.available {
                note_success(&format!("Model '{}' is installed", status.model));
                Ok(ExitCode::SUCCESS)
            } else {
                note_warn(&format!(
                    "Model '{}' is not installed {}",
                    status.model,
                    dim(&format!("(try `ollama pull {}`)", status.model))
                ));
                Ok(ExitCode::FAILURE)
            }
        }
        Err(err) => {
            note_error(&err.to_string());
            Ok(ExitCode::FAILURE)
        }
    }
}
