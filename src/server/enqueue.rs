//! Work-submission endpoints.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::info;

use crate::types::{PipelineResult, RepoUrl, RepoWorkItem, WorkKind};

use super::{AppState, ServerError};

/// `POST /enqueue`.
///
/// Accepts a full work item and returns 202 with the worker's acknowledgment
/// once the pipeline run has been scheduled. The run itself continues after
/// the response. A body that does not parse as a work item is a 400.
pub async fn enqueue_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<RepoWorkItem>, JsonRejection>,
) -> Result<(StatusCode, Json<PipelineResult>), ServerError> {
    let Json(item) = payload?;
    info!(repo = %item.repo_url, kind = %item.kind, "work item received");
    let result = app_state.route(item).await?;
    Ok((StatusCode::ACCEPTED, Json(result)))
}

#[derive(Debug, Deserialize)]
pub struct RunParams {
    repo: Option<String>,
}

/// `GET /run`.
///
/// Manual trigger: runs the pipeline for `?repo=<url>`, or for the stored
/// repository URL when the parameter is absent. Responds 400 when neither is
/// available.
pub async fn run_handler(
    State(app_state): State<AppState>,
    Query(params): Query<RunParams>,
) -> Result<(StatusCode, Json<PipelineResult>), ServerError> {
    let repo_url = params
        .repo
        .filter(|r| !r.trim().is_empty())
        .or_else(|| app_state.repos().repo_url())
        .ok_or(ServerError::NoRepoConfigured)?;

    info!(repo = %repo_url, "manual run requested");

    let item = RepoWorkItem {
        repo_url: RepoUrl::new(repo_url),
        branch: String::new(),
        sha: "HEAD".to_string(),
        kind: WorkKind::Manual,
    };
    let result = app_state.route(item).await?;
    Ok((StatusCode::ACCEPTED, Json(result)))
}
