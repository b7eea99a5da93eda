//! Image payload helpers.

use base64::{engine::general_purpose::STANDARD, Engine};

const DATA_URI_SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Remove a leading `data:<mime>;base64,` header, leaving pure base64.
///
/// Input without such a header is returned unchanged.
pub fn strip_data_uri(image: &str) -> &str {
    let Some(rest) = image.strip_prefix(DATA_URI_SCHEME) else {
        return image;
    };
    match rest.find(BASE64_MARKER) {
        Some(idx) if !rest[..idx].contains(',') => &rest[idx + BASE64_MARKER.len()..],
        _ => image,
    }
}

/// Base64-encode raw image bytes for transport.
pub fn encode_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
