//! Repository URL handling and normalization.
//!
//! Repository URLs arrive in many shapes: with trailing slashes, with
//! `/tree/<ref>/...` or `/blob/<ref>/...` browse suffixes, or with query
//! strings. All of them refer to the same repository, and the normalized
//! form is what keys the per-repository actors — so two spellings of the
//! same repo must normalize identically or work for one repo would be
//! spread across two actor instances.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error for malformed repository URLs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidRepoUrl {
    /// The URL was empty or whitespace-only.
    #[error("repository URL is empty")]
    Empty,

    /// The URL path does not contain an owner and repository segment.
    #[error("repository URL has no owner/repo path: {0}")]
    MissingOwnerRepo(String),
}

/// A repository URL.
///
/// Construction via [`RepoUrl::new`] does not normalize; call
/// [`RepoUrl::normalize`] to obtain the canonical form used as an actor key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoUrl(String);

impl RepoUrl {
    /// Creates a repository URL from a string, without normalizing.
    pub fn new(s: impl Into<String>) -> Self {
        RepoUrl(s.into())
    }

    /// Returns the URL as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the canonical form of this URL.
    ///
    /// Normalization trims whitespace, drops any query string, removes
    /// trailing slashes, and cuts the URL at a `/tree/` or `/blob/` browse
    /// suffix. The operation is idempotent: normalizing an already-normalized
    /// URL returns it unchanged.
    pub fn normalize(&self) -> RepoUrl {
        let mut url = self.0.trim();

        if let Some(idx) = url.find('?') {
            url = &url[..idx];
        }

        let mut url = url.trim_end_matches('/');

        // Browse URLs like https://github.com/o/r/tree/main/src point into
        // the repository; only the part before the suffix identifies it.
        if let Some(idx) = url.find("/tree/") {
            url = &url[..idx];
        }
        if let Some(idx) = url.find("/blob/") {
            url = &url[..idx];
        }

        RepoUrl(url.trim_end_matches('/').to_string())
    }

    /// Extracts the `(owner, repo)` pair from the URL path.
    ///
    /// Works on both normalized and unnormalized URLs; a trailing `.git`
    /// suffix on the repository name is stripped.
    pub fn owner_repo(&self) -> Result<(String, String), InvalidRepoUrl> {
        let normalized = self.normalize();
        let url = normalized.as_str();
        if url.is_empty() {
            return Err(InvalidRepoUrl::Empty);
        }

        // Path after the host: scheme://host/<owner>/<repo>
        let path = url
            .splitn(2, "://")
            .nth(1)
            .and_then(|rest| rest.split_once('/'))
            .map(|(_, path)| path)
            .ok_or_else(|| InvalidRepoUrl::MissingOwnerRepo(url.to_string()))?;

        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let owner = segments
            .next()
            .ok_or_else(|| InvalidRepoUrl::MissingOwnerRepo(url.to_string()))?;
        let repo = segments
            .next()
            .ok_or_else(|| InvalidRepoUrl::MissingOwnerRepo(url.to_string()))?;

        Ok((
            owner.to_string(),
            repo.trim_end_matches(".git").to_string(),
        ))
    }

    /// Returns the repository name (final path segment, without `.git`).
    pub fn repo_name(&self) -> String {
        let normalized = self.normalize();
        normalized
            .as_str()
            .rsplit('/')
            .next()
            .unwrap_or("")
            .trim_end_matches(".git")
            .to_string()
    }
}

impl fmt::Display for RepoUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RepoUrl {
    fn from(s: String) -> Self {
        RepoUrl(s)
    }
}

impl From<&str> for RepoUrl {
    fn from(s: &str) -> Self {
        RepoUrl(s.to_string())
    }
}
