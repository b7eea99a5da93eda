use async_trait::async_trait;

use crate::error::InferenceError;
use crate::types::{GuessResult, ModelStatus};

/// Something that can look at a drawing and name it.
///
/// Implementations never panic and never return an untyped error: every
/// failure comes back as an [`InferenceError`]. Dropping the returned future
/// cancels any in-flight backend request.
#[async_trait]
pub trait Guesser: Send + Sync {
    /// Short identifier for logs (e.g. "ollama", "mock").
    fn name(&self) -> &str;

    /// Produce a guess for a base64 image, optionally carrying a
    /// `data:<mime>;base64,` prefix.
    async fn guess(&self, image: &str) -> Result<GuessResult, InferenceError>;

    /// Report whether the backing model is available.
    async fn check_model(&self) -> Result<ModelStatus, InferenceError>;
}
