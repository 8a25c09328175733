//! Route handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Instrument;

use parley_skill::envelope::SkillResponse;

use crate::error::ApiError;
use crate::state::AppState;

/// Response body for GET /health.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// POST /skill - handle one platform turn.
///
/// Any JSON body gets a 200 reply; envelopes the skill cannot interpret are
/// answered with a spoken clarification.
pub async fn skill(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SkillResponse>, ApiError> {
    let raw: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, bytes = body.len(), "Rejected non-JSON skill request");
        ApiError::BadRequest(format!("request body is not JSON: {}", e))
    })?;

    let session_id = raw
        .pointer("/session/sessionId")
        .and_then(Value::as_str)
        .unwrap_or("-")
        .to_string();
    let intent = raw
        .pointer("/request/intent/name")
        .or_else(|| raw.pointer("/request/type"))
        .and_then(Value::as_str)
        .unwrap_or("-")
        .to_string();

    let span = tracing::info_span!("turn", session_id = %session_id, intent = %intent);
    let reply = state.handler.handle_value(&raw).instrument(span).await;
    Ok(Json(reply))
}

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
