//! Terminal output utilities: colored status notes.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Format a note with a colored glyph, or a plain label when color is off.
fn note(color: bool, glyph_style: &str, glyph: &str, label: &str, msg: &str) -> String {
    if color {
        format!("{glyph_style}{BOLD}{glyph}{RESET} {msg}")
    } else {
        format!("{label}: {msg}")
    }
}

/// Print a formatted INFO note to stderr.
pub fn note_info(msg: &str) {
    eprintln!("{}", note(supports_color(), CYAN, "ℹ", "INFO", msg));
}

/// Print a formatted WARNING note to stderr.
pub fn note_warn(msg: &str) {
    eprintln!("{}", note(supports_color(), YELLOW, "⚠", "WARN", msg));
}

/// Print a formatted ERROR note to stderr.
pub fn note_error(msg: &str) {
    eprintln!("{}", note(supports_color(), RED, "✗", "ERROR", msg));
}

/// Print a formatted SUCCESS note to stderr.
pub fn note_success(msg: &str) {
    eprintln!("{}", note(supports_color(), GREEN, "✓", "OK", msg));
}

/// Dim a secondary detail when color is on.
pub fn dim(msg: &str) -> String {
    if supports_color() {
        format!("{DIM}{msg}{RESET}")
    } else {
        msg.to_string()
    }
}
