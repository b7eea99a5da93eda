pub mod error;
pub mod traits;
pub mod types;

pub use error::{ErrorKind, InferenceError};
pub use traits::Guesser;
pub use types::{Confidence, GuessResult, ModelStatus};
