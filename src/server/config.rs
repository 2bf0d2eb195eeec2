//! Stored-settings endpoints.
//!
//! The token endpoint never echoes the token back; `GET` only reports
//! whether one is configured.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::json;
use tracing::info;

use super::{AppState, ServerError};

/// `GET /config/token` - reports whether a token is stored.
pub async fn get_token_handler(
    State(app_state): State<AppState>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    match app_state.tokens().github_token() {
        Some(_) => Ok(Json(json!({ "configured": true }))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// `PUT /config/token` - stores a new token (raw request body).
pub async fn put_token_handler(
    State(app_state): State<AppState>,
    body: String,
) -> Result<StatusCode, ServerError> {
    app_state.tokens().set_github_token(&body)?;
    info!("github token updated");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /config/repo` - returns the stored default repository URL.
pub async fn get_repo_handler(
    State(app_state): State<AppState>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    match app_state.repos().repo_url() {
        Some(url) => Ok(Json(json!({ "repo_url": url }))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// `PUT /config/repo` - stores a new default repository URL (raw body).
pub async fn put_repo_handler(
    State(app_state): State<AppState>,
    body: String,
) -> Result<StatusCode, ServerError> {
    app_state.repos().set_repo_url(&body)?;
    info!(repo = %body.trim(), "default repository updated");
    Ok(StatusCode::NO_CONTENT)
}
