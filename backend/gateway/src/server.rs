//! Router and shared state.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use scribble_core::Guesser;

use crate::guess_api;
use crate::health_api;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub guesser: Arc<dyn Guesser>,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(guesser: Arc<dyn Guesser>) -> Self {
        Self {
            guesser,
            started_at: Instant::now(),
        }
    }
}

/// Build the API router. `max_body_bytes` bounds the accepted canvas snapshot.
pub fn build_router(state: GatewayState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/api/guess", post(guess_api::post_guess))
        .route("/api/health", get(health_api::get_health))
        .route("/api/model", get(health_api::get_model))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribble_core::{ErrorKind, InferenceError};
    use scribble_inference::MockGuesser;
    use serde_json::{json, Value};

    async fn spawn(guesser: MockGuesser, max_body_bytes: usize) -> String {
        let app = build_router(GatewayState::new(Arc::new(guesser)), max_body_bytes);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn post_guess(base: &str, body: Value) -> (u16, Value) {
        let resp = reqwest::Client::new()
            .post(format!("{base}/api/guess"))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    #[tokio::test]
    async fn guess_success_shape() {
        let base = spawn(MockGuesser::new("mock").with_reply("It is a cat\nhigh").with_duration(640), 1024).await;
        let (status, body) = post_guess(&base, json!({ "image": "data:image/png;base64,AAAA" })).await;
        assert_eq!(status, 200);
        assert_eq!(body, json!({ "guess": "cat", "confidence": "high", "duration": 640 }));
    }

    #[tokio::test]
    async fn empty_guess_maps_to_500() {
        let base = spawn(MockGuesser::new("mock").with_reply("high"), 1024).await;
        let (status, body) = post_guess(&base, json!({ "image": "AAAA" })).await;
        assert_eq!(status, 500);
        assert_eq!(body["code"], "EMPTY_GUESS");
    }

    #[tokio::test]
    async fn timeout_maps_to_504() {
        let mock = MockGuesser::new("mock").with_error(InferenceError::timeout("no reply in 120s"));
        let base = spawn(mock, 1024).await;
        let (status, body) = post_guess(&base, json!({ "image": "AAAA" })).await;
        assert_eq!(status, 504);
        assert_eq!(body, json!({ "error": "no reply in 120s", "code": "TIMEOUT" }));
    }

    #[tokio::test]
    async fn model_not_found_maps_to_503() {
        let mock = MockGuesser::new("mock")
            .with_error(InferenceError::new(ErrorKind::ModelNotFound, "model not found"));
        let base = spawn(mock, 1024).await;
        let (status, body) = post_guess(&base, json!({ "image": "AAAA" })).await;
        assert_eq!(status, 503);
        assert_eq!(body["code"], "MODEL_NOT_FOUND");
    }

    #[tokio::test]
    async fn missing_image_is_bad_request() {
        let base = spawn(MockGuesser::new("mock"), 1024).await;
        let (status, body) = post_guess(&base, json!({})).await;
        assert_eq!(status, 400);
        assert_eq!(body["code"], "INVALID_REQUEST");

        let (status, _) = post_guess(&base, json!({ "image": "   " })).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let base = spawn(MockGuesser::new("mock"), 1024).await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/api/guess"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let base = spawn(MockGuesser::new("mock"), 256).await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/api/guess"))
            .json(&json!({ "image": "A".repeat(4096) }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 413);
    }

    #[tokio::test]
    async fn health_and_model_routes() {
        let base = spawn(MockGuesser::new("mock"), 1024).await;
        let health: Value = reqwest::get(format!("{base}/api/health")).await.unwrap().json().await.unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["guesser"], "mock");

        let model: Value = reqwest::get(format!("{base}/api/model")).await.unwrap().json().await.unwrap();
        assert_eq!(model["available"], true);
    }
}
