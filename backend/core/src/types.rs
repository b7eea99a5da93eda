use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse self-reported certainty attached to a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Keywords in the order the normalizer tries them.
    pub const ALL: [Confidence; 3] = [Confidence::High, Confidence::Medium, Confidence::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful outcome of one guess request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessResult {
    /// Extracted subject label. Never empty.
    pub guess: String,
    pub confidence: Confidence,
    /// Backend-reported processing time in milliseconds.
    pub duration: u64,
}

/// Whether the configured model is installed on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub model: String,
    pub available: bool,
    pub installed: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guess_result_wire_shape() {
        let result = GuessResult {
            guess: "cat".into(),
            confidence: Confidence::High,
            duration: 812,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "guess": "cat", "confidence": "high", "duration": 812 })
        );
    }

    #[test]
    fn confidence_order() {
        assert_eq!(
            Confidence::ALL.map(|c| c.as_str()),
            ["high", "medium", "low"]
        );
    }
}
