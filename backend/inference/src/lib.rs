//! Inference layer: sends a drawing to a vision model and turns whatever it
//! says into a typed guess.

pub mod image;
pub mod normalize;
pub mod prompt;
pub mod providers;

pub use image::{encode_image, strip_data_uri};
pub use normalize::parse_reply;
pub use providers::mock::MockGuesser;
pub use providers::ollama::OllamaGuesser;
