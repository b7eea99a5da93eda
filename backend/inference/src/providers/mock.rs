use async_trait::async_trait;
use scribble_core::{GuessResult, Guesser, InferenceError, ModelStatus};

use crate::normalize::parse_reply;

const MOCK_MODEL: &str = "mock";

/// A guesser that returns a canned reply without touching the network.
///
/// Canned replies go through the real normalizer, so a mock reply of
/// `"high"` fails with `EMPTY_GUESS` just as a real one would.
pub struct MockGuesser {
    name: String,
    reply: Result<String, InferenceError>,
    duration_ms: u64,
}

impl MockGuesser {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reply: Ok("It is a house\nhigh".to_string()),
            duration_ms: 0,
        }
    }

    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = Ok(reply.into());
        self
    }

    pub fn with_error(mut self, error: InferenceError) -> Self {
        self.reply = Err(error);
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

#[async_trait]
impl Guesser for MockGuesser {
    fn name(&self) -> &str {
        &self.name
    }

    async fn guess(&self, _image: &str) -> Result<GuessResult, InferenceError> {
        match &self.reply {
            Ok(raw) => parse_reply(raw, self.duration_ms),
            Err(err) => Err(err.clone()),
        }
    }

    async fn check_model(&self) -> Result<ModelStatus, InferenceError> {
        Ok(ModelStatus {
            model: MOCK_MODEL.to_string(),
            available: true,
            installed: vec![MOCK_MODEL.to_string()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribble_core::{Confidence, ErrorKind};

    #[tokio::test]
    async fn canned_reply_is_normalized() {
        let mock = MockGuesser::new("mock").with_reply("Answer: kite\nlow").with_duration(42);
        let result = mock.guess("AAAA").await.unwrap();
        assert_eq!(result.guess, "kite");
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(result.duration, 42);
    }

    #[tokio::test]
    async fn canned_error_is_returned() {
        let mock = MockGuesser::new("mock").with_error(InferenceError::timeout("slow"));
        let err = mock.guess("AAAA").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
    }
}
