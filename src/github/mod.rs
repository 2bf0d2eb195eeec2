//! GitHub collaborator: the [`PullRequests`] trait and its octocrab-backed
//! implementation.

mod client;

pub use client::GithubClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{InvalidRepoUrl, RepoUrl};

/// Errors from talking to the GitHub API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No token is stored, so authenticated calls are impossible.
    #[error("no GitHub token configured")]
    MissingToken,

    /// The repository URL could not be resolved to an owner/repo pair.
    #[error(transparent)]
    BadRepoUrl(#[from] InvalidRepoUrl),

    /// The underlying API call failed.
    #[error("GitHub API call failed: {0}")]
    Api(#[from] octocrab::Error),
}

/// Pull-request operations consumed by the pipeline.
#[async_trait]
pub trait PullRequests: Send + Sync {
    /// Opens a pull request from `head` into `base` on the repository named
    /// by `repo_url` and returns its browser URL.
    async fn create(
        &self,
        repo_url: &RepoUrl,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<String, ApiError>;
}
