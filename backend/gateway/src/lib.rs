//! Scribble HTTP API.
//!
//! Exposes the guess operation as `POST /api/guess` and maps the closed
//! error-kind set onto HTTP status codes.

pub mod guess_api;
pub mod health_api;
pub mod server;

pub use guess_api::status_for;
pub use server::{build_router, GatewayState};
