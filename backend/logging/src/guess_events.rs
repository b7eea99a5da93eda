//! Guess Event Logger
//!
//! One structured event per stage of a guess request, emitted through
//! `tracing` under the `guess_events` target so they land in the NDJSON log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GuessEvent {
    Requested {
        image_bytes: usize,
    },
    Succeeded {
        guess: String,
        confidence: String,
        duration_ms: u64,
    },
    Failed {
        code: String,
        message: String,
    },
}

#[derive(Debug, Serialize)]
pub struct GuessEventEntry {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: GuessEvent,
}

impl GuessEventEntry {
    /// One-line JSON for the event log.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

pub struct GuessEventLogger;

impl GuessEventLogger {
    /// Redact and emit one guess event.
    pub fn log_event(request_id: &str, event: GuessEvent) {
        let entry = Self::entry(request_id, event);
        info!(
            target: "guess_events",
            request_id = %entry.request_id,
            event = %entry.to_json(),
            "Guess event"
        );
    }

    fn entry(request_id: &str, mut event: GuessEvent) -> GuessEventEntry {
        // Model text and backend errors can echo the request back.
        match &mut event {
            GuessEvent::Requested { .. } => {}
            GuessEvent::Succeeded { guess, .. } => *guess = redact_sensitive_data(guess),
            GuessEvent::Failed { message, .. } => *message = redact_sensitive_data(message),
        }
        GuessEventEntry {
            request_id: request_id.to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}
