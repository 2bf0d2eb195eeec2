//! GitHub push webhook endpoint.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use tracing::{debug, warn};

use crate::types::{PipelineResult, RepoUrl, RepoWorkItem, WorkKind};

use super::signature::verify_signature;
use super::{AppState, ServerError};

const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// `POST /webhooks/github`.
///
/// Accepts GitHub push deliveries. When a webhook secret is configured, the
/// `X-Hub-Signature-256` header is verified before any parsing; without a
/// secret, deliveries are accepted as-is (local development).
///
/// The payload's `repository.clone_url`, `ref`, and `after` become the work
/// item; everything else in the delivery is ignored.
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<PipelineResult>), ServerError> {
    if let Some(secret) = app_state.webhook_secret() {
        let header = headers
            .get(HEADER_SIGNATURE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !verify_signature(&body, header, secret) {
            warn!("webhook signature verification failed");
            return Err(ServerError::InvalidSignature);
        }
    }

    let payload: serde_json::Value = serde_json::from_slice(&body)?;

    let clone_url = payload
        .get("repository")
        .and_then(|r| r.get("clone_url"))
        .and_then(|u| u.as_str())
        .ok_or(ServerError::MissingField("repository.clone_url"))?;

    // "refs/heads/main" -> "main"; tags and other refs pass through as-is.
    let branch = payload
        .get("ref")
        .and_then(|r| r.as_str())
        .map(|r| r.strip_prefix("refs/heads/").unwrap_or(r))
        .unwrap_or_default()
        .to_string();

    let sha = payload
        .get("after")
        .and_then(|a| a.as_str())
        .unwrap_or_default()
        .to_string();

    debug!(repo = %clone_url, branch = %branch, sha = %sha, "push webhook received");

    let item = RepoWorkItem {
        repo_url: RepoUrl::new(clone_url),
        branch,
        sha,
        kind: WorkKind::Push,
    };
    let result = app_state.route(item).await?;
    Ok((StatusCode::ACCEPTED, Json(result)))
}
