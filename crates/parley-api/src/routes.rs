//! Router setup with API routes and middleware.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use parley_core::error::ParleyError;

use crate::handlers;
use crate::state::AppState;

/// Platform envelopes are small; anything bigger is not a real turn.
const MAX_BODY_BYTES: usize = 256 * 1024;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/skill", post(handlers::skill))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server on the configured port.
///
/// Binds to all interfaces: the platform (or a tunnel in front of it) must be
/// able to reach the endpoint.
pub async fn start_server(state: AppState) -> Result<(), ParleyError> {
    let addr = format!("0.0.0.0:{}", state.config.general.port);
    let router = create_router(state);

    tracing::info!("Starting skill endpoint on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ParleyError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| ParleyError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
