//! Guess endpoint (`POST /api/guess`).

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use scribble_core::{ErrorKind, InferenceError};
use scribble_logging::{GuessEvent, GuessEventLogger};

use crate::server::GatewayState;

/// Code for request-shape problems; never produced by the inference layer.
pub const INVALID_REQUEST_CODE: &str = "INVALID_REQUEST";

#[derive(Debug, Deserialize)]
pub struct GuessRequest {
    /// Base64 PNG, with or without a `data:` header.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// HTTP status for each inference failure kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ModelNotFound => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::OllamaServerError => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::NetworkError => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::EmptyGuess => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::UnknownError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Render an inference failure as `{error, code}` with its mapped status.
pub fn error_response(err: InferenceError) -> Response {
    let status = status_for(err.kind);
    let body = ErrorResponse {
        error: err.message,
        code: err.kind.code().to_string(),
    };
    (status, Json(body)).into_response()
}

fn invalid_request(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorResponse {
        error: message.into(),
        code: INVALID_REQUEST_CODE.to_string(),
    };
    (status, Json(body)).into_response()
}

/// Handler for `POST /api/guess`.
pub async fn post_guess(
    State(state): State<GatewayState>,
    payload: Result<Json<GuessRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => return invalid_request(rejection.status(), rejection.body_text()),
    };
    let image = match request.image {
        Some(image) if !image.trim().is_empty() => image,
        _ => return invalid_request(StatusCode::BAD_REQUEST, "Missing 'image' field"),
    };

    let request_id = Uuid::new_v4().to_string();
    let span = info_span!("guess", request_id = %request_id, guesser = state.guesser.name());

    async move {
        GuessEventLogger::log_event(
            &request_id,
            GuessEvent::Requested {
                image_bytes: image.len(),
            },
        );

        match state.guesser.guess(&image).await {
            Ok(result) => {
                GuessEventLogger::log_event(
                    &request_id,
                    GuessEvent::Succeeded {
                        guess: result.guess.clone(),
                        confidence: result.confidence.to_string(),
                        duration_ms: result.duration,
                    },
                );
                (StatusCode::OK, Json(result)).into_response()
            }
            Err(err) => {
                GuessEventLogger::log_event(
                    &request_id,
                    GuessEvent::Failed {
                        code: err.kind.code().to_string(),
                        message: err.message.clone(),
                    },
                );
                error_response(err)
            }
        }
    }
    .instrument(span)
    .await
}
