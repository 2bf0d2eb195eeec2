//! The per-repository worker actor.

use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::pipeline::Pipeline;
use crate::runtime::{Actor, Reply};
use crate::types::{PipelineRequest, PipelineResult};

/// Messages accepted by a worker.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Run the pipeline for this request.
    Process(PipelineRequest),
}

/// Runs pipelines for one repository, one at a time.
///
/// The handler acknowledges as soon as the run is scheduled and then executes
/// the pipeline before returning, so the mailbox — and with it any further
/// request for the same repository — waits until the run finishes. The
/// caller only ever sees the acknowledgment.
pub struct WorkerActor {
    pipeline: Arc<Pipeline>,
}

impl WorkerActor {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        WorkerActor { pipeline }
    }
}

#[async_trait]
impl Actor for WorkerActor {
    type Message = WorkerMessage;
    type Reply = PipelineResult;
    type Error = Infallible;

    async fn handle(&mut self, message: WorkerMessage, reply: Reply<PipelineResult, Infallible>) {
        let WorkerMessage::Process(request) = message;

        info!(
            repo = %request.repo_url,
            sha = %request.sha,
            origin = %request.origin,
            "pipeline run scheduled"
        );
        reply.ok(PipelineResult::started(&request.repo_url));

        // The caller has already been resumed; this runs on the worker's own
        // time and serializes with later requests for the same repository.
        self.pipeline.run(&request).await;
    }
}
