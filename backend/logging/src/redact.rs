//! Log Redaction
//!
//! Canvas snapshots arrive as multi-megabyte base64 strings. They are
//! reduced to a size marker before anything reaches a log line.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// A data URI header, or any base64 run long enough to be a binary payload.
static IMAGE_PAYLOAD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(data:[\w/+.\-]+;base64,)?[A-Za-z0-9+/]{128,}={0,2}").unwrap()
});
static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bearer\s+[a-zA-Z0-9\-\._~+/]+=*").unwrap());

/// Replace base64 image payloads with `[image: N bytes base64]`.
pub fn redact_image_payload(input: &str) -> String {
    IMAGE_PAYLOAD_RE
        .replace_all(input, |caps: &Captures| {
            let header_len = caps.get(1).map_or(0, |m| m.len());
            format!("[image: {} bytes base64]", caps[0].len() - header_len)
        })
        .into_owned()
}

/// Redacts image payloads and bearer tokens in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = redact_image_payload(input);
    BEARER_RE.replace_all(&redacted, "[REDACTED_TOKEN]").into_owned()
}
