//! Health and model availability endpoints.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::guess_api::error_response;
use crate::server::GatewayState;

#[derive(Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub guesser: String,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

/// Handler for `GET /api/health`. Reports on this process only; the
/// backend is checked by `/api/model`.
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        service: "scribble",
        version: env!("CARGO_PKG_VERSION"),
        guesser: state.guesser.name().to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now(),
    })
}

/// Handler for `GET /api/model`.
pub async fn get_model(State(state): State<GatewayState>) -> Response {
    match state.guesser.check_model().await {
        Ok(status) => Json(status).into_response(),
        Err(err) => error_response(err),
    }
}
