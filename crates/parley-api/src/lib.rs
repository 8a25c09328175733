//! Parley API crate - axum HTTP endpoint for the skill.
//!
//! Exposes the turn handler to the voice platform at `POST /skill` and a
//! liveness probe at `GET /health`.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
