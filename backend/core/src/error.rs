use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of failure kinds a guess request can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The backend does not have the requested model.
    ModelNotFound,
    /// The backend failed internally (5xx).
    OllamaServerError,
    /// No complete response arrived before the deadline.
    Timeout,
    /// No HTTP exchange completed (connect, DNS, reset).
    NetworkError,
    /// The model replied, but no line could be used as a guess.
    EmptyGuess,
    /// Anything not covered above.
    UnknownError,
}

impl ErrorKind {
    /// Wire code, e.g. `MODEL_NOT_FOUND`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ModelNotFound => "MODEL_NOT_FOUND",
            Self::OllamaServerError => "OLLAMA_SERVER_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::NetworkError => "NETWORK_ERROR",
            Self::EmptyGuess => "EMPTY_GUESS",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Whether a caller may reasonably try the same request again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::OllamaServerError | Self::Timeout | Self::NetworkError => true,
            Self::ModelNotFound | Self::EmptyGuess | Self::UnknownError => false,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Typed failure of a guess request: a kind plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct InferenceError {
    pub kind: ErrorKind,
    pub message: String,
}

impl InferenceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn model_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ModelNotFound, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OllamaServerError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkError, message)
    }

    pub fn empty_guess(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EmptyGuess, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownError, message)
    }
}
