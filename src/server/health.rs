//! Health check endpoint.

use axum::http::StatusCode;

/// `GET /health` - liveness probe. Returns 200 while the server is up.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
