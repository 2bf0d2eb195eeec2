//! Request and result records exchanged between the boundary and the actors.
//!
//! All three records are immutable: the boundary produces a [`RepoWorkItem`],
//! the router turns it into a [`PipelineRequest`], and the worker answers with
//! a [`PipelineResult`]. The result is a synchronous acknowledgment only —
//! the pipeline itself runs after the ack and its outcome is never reported
//! back through these types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::repo::RepoUrl;

/// Where a piece of work originated.
///
/// This is purely an origin marker carried through for logging; it never
/// influences how the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkKind {
    /// Triggered by a pull-request webhook.
    Pr,
    /// Triggered by a push webhook.
    Push,
    /// Triggered manually through the HTTP API.
    Manual,
}

impl fmt::Display for WorkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkKind::Pr => "pr",
            WorkKind::Push => "push",
            WorkKind::Manual => "manual",
        };
        write!(f, "{s}")
    }
}

/// A unit of work produced by the request boundary.
///
/// Consumed exactly once by the router actor; `repo_url` may be any spelling
/// of the repository URL and `sha` may be blank (defaulted downstream).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoWorkItem {
    /// Repository URL as received, not yet normalized.
    pub repo_url: RepoUrl,

    /// Branch named by the triggering event.
    pub branch: String,

    /// Commit to process; blank means "whatever HEAD is at clone time".
    pub sha: String,

    /// Origin of the request.
    pub kind: WorkKind,
}

/// The request handed to a worker actor.
///
/// Built by the router from a [`RepoWorkItem`]: the URL is normalized and a
/// blank sha has been replaced with the literal `"HEAD"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRequest {
    /// Normalized repository URL; equal to the worker's actor key.
    pub repo_url: RepoUrl,

    /// Commit to process, or the literal `"HEAD"`.
    pub sha: String,

    /// Origin of the request, for logging.
    pub origin: WorkKind,
}

/// Status of the synchronous acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The pipeline was scheduled.
    Started,
    /// The pipeline could not be scheduled.
    Failed,
}

/// Synchronous reply to a process request.
///
/// Says only whether the pipeline was launched. It does not — and cannot —
/// describe how the run ended; callers have no way to observe that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub status: RunStatus,
    pub message: String,
}

impl PipelineResult {
    /// The acknowledgment sent as soon as a pipeline run is scheduled.
    pub fn started(repo_url: &RepoUrl) -> Self {
        PipelineResult {
            status: RunStatus::Started,
            message: format!("pipeline launched for {repo_url}"),
        }
    }
}
