//! Structured logging for Scribble.
//!
//! Console plus optional rolling JSON file output, redaction of image
//! payloads, and per-request guess events.

pub mod guess_events;
pub mod logger;
pub mod redact;

pub use guess_events::{GuessEvent, GuessEventLogger};
pub use logger::init_logger;
pub use redact::{redact_image_payload, redact_sensitive_data};
