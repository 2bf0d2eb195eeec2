//! HTTP boundary.
//!
//! The server is intentionally thin: every endpoint either reads or writes a
//! config store, or shapes a [`RepoWorkItem`](crate::types::RepoWorkItem) and
//! dispatches it to the router registry. All pipeline work happens behind the
//! actors, after the response has gone out.
//!
//! # Endpoints
//!
//! - `POST /enqueue` - accepts a work item, returns 202 once acknowledged
//! - `GET /run` - manual trigger (`?repo=<url>`, falls back to the stored URL)
//! - `POST /webhooks/github` - GitHub push webhooks
//! - `GET|PUT /config/token`, `GET|PUT /config/repo` - stored settings
//! - `GET /health` - liveness

pub mod config;
pub mod enqueue;
pub mod health;
pub mod signature;
pub mod webhook;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::actors::{RouteError, RouterActor, RouterMessage};
use crate::config::{ConfigError, RepoStore, TokenStore};
use crate::runtime::{ActorKey, DispatchError, Registry};
use crate::types::{PipelineResult, RepoWorkItem};

/// Shared application state, passed to handlers via axum's `State`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    routers: Arc<Registry<RouterActor>>,
    tokens: Arc<TokenStore>,
    repos: Arc<RepoStore>,

    /// Webhook HMAC secret; verification is skipped when `None`.
    webhook_secret: Option<Vec<u8>>,
}

impl AppState {
    pub fn new(
        routers: Arc<Registry<RouterActor>>,
        tokens: Arc<TokenStore>,
        repos: Arc<RepoStore>,
        webhook_secret: Option<Vec<u8>>,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                routers,
                tokens,
                repos,
                webhook_secret,
            }),
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    pub fn repos(&self) -> &RepoStore {
        &self.inner.repos
    }

    pub fn webhook_secret(&self) -> Option<&[u8]> {
        self.inner.webhook_secret.as_deref()
    }

    /// Routes a work item through the router registry, keyed by the
    /// normalized repository URL.
    pub async fn route(&self, item: RepoWorkItem) -> Result<PipelineResult, ServerError> {
        let key = ActorKey::new(item.repo_url.normalize().as_str());
        let result = self
            .inner
            .routers
            .dispatch(&key, RouterMessage::Enqueue(item))
            .await?;
        Ok(result)
    }
}

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ServerError {
    /// No repository URL was given and none is stored.
    #[error("no repository URL given and none stored")]
    NoRepoConfigured,

    /// The webhook signature did not verify.
    #[error("invalid signature")]
    InvalidSignature,

    /// The webhook payload was missing a required field.
    #[error("missing field in webhook payload: {0}")]
    MissingField(&'static str),

    /// The request body was not valid JSON.
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The request body did not parse as the expected record.
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] axum::extract::rejection::JsonRejection),

    /// A config store rejected the write.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Routing failed before the pipeline could be scheduled.
    #[error("failed to route work item: {0}")]
    Routing(#[from] DispatchError<RouteError>),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::NoRepoConfigured => StatusCode::BAD_REQUEST,
            ServerError::InvalidSignature => StatusCode::UNAUTHORIZED,
            ServerError::MissingField(_) => StatusCode::BAD_REQUEST,
            ServerError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ServerError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ServerError::Config(ConfigError::EmptyValue) => StatusCode::BAD_REQUEST,
            ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Routing(DispatchError::Handler(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Routing(DispatchError::ReplyDropped) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Routing(DispatchError::ShuttingDown) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, self.to_string()).into_response()
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/enqueue", post(enqueue::enqueue_handler))
        .route("/run", get(enqueue::run_handler))
        .route("/webhooks/github", post(webhook::webhook_handler))
        .route(
            "/config/token",
            get(config::get_token_handler).put(config::put_token_handler),
        )
        .route(
            "/config/repo",
            get(config::get_repo_handler).put(config::put_repo_handler),
        )
        .route("/health", get(health::health_handler))
        .with_state(app_state)
}
