//! Turns a free-text model reply into a typed guess.
//!
//! The model is asked for two lines (subject, then high/medium/low) but is
//! not trusted to comply. Parsing is two ordered passes over the trimmed,
//! non-blank lines: one for the guess, one for the confidence.

use scribble_core::{Confidence, GuessResult, InferenceError};

/// Guess reported when the model said nothing at all.
pub const UNCLEAR_GUESS: &str = "unclear";

/// Boilerplate a model likes to put in front of its answer.
const GUESS_PREFIXES: [&str; 5] = ["guess:", "guess -", "answer:", "answer -", "it is "];

/// Articles dropped after a boilerplate prefix ("It is a cat" -> "cat").
const ARTICLES: [&str; 2] = ["a ", "an "];

/// Confidence used when no keyword appears anywhere in the reply.
const DEFAULT_CONFIDENCE: Confidence = Confidence::Medium;

/// Parse a raw model reply into a [`GuessResult`].
///
/// Empty or whitespace-only replies succeed as `"unclear"` with low
/// confidence. A non-empty reply with no usable guess line fails with
/// `EMPTY_GUESS`.
pub fn parse_reply(raw: &str, duration_ms: u64) -> Result<GuessResult, InferenceError> {
    if raw.trim().is_empty() {
        return Ok(GuessResult {
            guess: UNCLEAR_GUESS.to_string(),
            confidence: Confidence::Low,
            duration: duration_ms,
        });
    }

    let lines = candidate_lines(raw);
    let confidence = extract_confidence(&lines);

    match extract_guess(&lines) {
        Some(guess) => Ok(GuessResult {
            guess,
            confidence,
            duration: duration_ms,
        }),
        None => Err(InferenceError::empty_guess(format!(
            "Model reply contained no usable guess: {:?}",
            preview(raw)
        ))),
    }
}

/// Trimmed, non-blank lines in reply order.
pub fn candidate_lines(raw: &str) -> Vec<&str> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// First line that is not a confidence line and is non-empty once
/// boilerplate is stripped.
pub fn extract_guess(lines: &[&str]) -> Option<String> {
    for line in lines {
        if is_confidence_line(line) {
            continue;
        }
        let guess = strip_boilerplate(line);
        if !guess.is_empty() {
            return Some(guess.to_string());
        }
    }
    None
}

/// First confidence keyword found scanning every line, guess line included.
pub fn extract_confidence(lines: &[&str]) -> Confidence {
    for line in lines {
        if let Some(confidence) = confidence_in(line) {
            return confidence;
        }
    }
    DEFAULT_CONFIDENCE
}

fn confidence_in(line: &str) -> Option<Confidence> {
    let lower = line.to_lowercase();
    Confidence::ALL
        .into_iter()
        .find(|confidence| lower.contains(confidence.as_str()))
}

fn is_confidence_line(line: &str) -> bool {
    confidence_in(line).is_some()
}

/// Strips stacked prefixes too ("Guess: It is a cat" -> "cat").
fn strip_boilerplate(line: &str) -> &str {
    let mut rest = line;
    let mut stripped = false;
    while let Some(tail) = strip_prefix_ignore_case(rest, &GUESS_PREFIXES) {
        rest = tail.trim();
        stripped = true;
    }
    if !stripped {
        return line;
    }
    strip_prefix_ignore_case(rest, &ARTICLES)
        .map(str::trim)
        .unwrap_or(rest)
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|prefix| {
        let head = s.get(..prefix.len())?;
        head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
    })
}

fn preview(raw: &str) -> String {
    const MAX_CHARS: usize = 120;
    let mut out: String = raw.chars().take(MAX_CHARS).collect();
    if raw.chars().count() > MAX_CHARS {
        out.push_str("...");
    }
    out
}
