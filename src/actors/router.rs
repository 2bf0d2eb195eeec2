//! The routing actor: canonicalization and dispatch to workers.

use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::runtime::{Actor, ActorKey, DispatchError, Registry, Reply};
use crate::types::{PipelineRequest, PipelineResult, RepoWorkItem};

use super::worker::{WorkerActor, WorkerMessage};

/// Messages accepted by a router.
#[derive(Debug)]
pub enum RouterMessage {
    /// Route this work item to its repository's worker.
    Enqueue(RepoWorkItem),
}

/// Errors surfaced to the boundary when routing fails.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("failed to dispatch to worker: {0}")]
    Worker(#[from] DispatchError<Infallible>),
}

/// Normalizes incoming work and forwards it to the worker registry.
///
/// The router's key is already the normalized repository URL (the boundary
/// normalizes before dispatching), so its main job is to default a blank sha
/// to `HEAD`, shape the request, and relay the worker's acknowledgment.
pub struct RouterActor {
    workers: Arc<Registry<WorkerActor>>,
}

impl RouterActor {
    pub fn new(workers: Arc<Registry<WorkerActor>>) -> Self {
        RouterActor { workers }
    }
}

#[async_trait]
impl Actor for RouterActor {
    type Message = RouterMessage;
    type Reply = PipelineResult;
    type Error = RouteError;

    async fn handle(&mut self, message: RouterMessage, reply: Reply<PipelineResult, RouteError>) {
        let RouterMessage::Enqueue(item) = message;

        let repo_url = item.repo_url.normalize();
        let sha = if item.sha.trim().is_empty() {
            "HEAD".to_string()
        } else {
            item.sha.trim().to_string()
        };

        debug!(
            repo = %repo_url,
            sha = %sha,
            branch = %item.branch,
            kind = %item.kind,
            "routing work item"
        );

        let request = PipelineRequest {
            repo_url: repo_url.clone(),
            sha,
            origin: item.kind,
        };

        // The worker acknowledges before running the pipeline, so this await
        // resolves quickly even when a long run follows.
        let key = ActorKey::new(repo_url.as_str());
        match self
            .workers
            .dispatch(&key, WorkerMessage::Process(request))
            .await
        {
            Ok(result) => reply.ok(result),
            Err(e) => reply.err(RouteError::Worker(e)),
        }
    }
}
