//! Octocrab-backed pull-request client.
//!
//! Unlike a repo-scoped client, this one serves every repository the bot is
//! asked to work on, so the owner/repo pair is derived per call from the
//! request's URL. The token is read from the store per call, so a token
//! updated through the HTTP API takes effect on the next pull request
//! without a restart.

use std::sync::Arc;

use async_trait::async_trait;
use octocrab::Octocrab;
use tracing::{info, instrument};

use crate::config::TokenStore;
use crate::types::RepoUrl;

use super::{ApiError, PullRequests};

/// Pull-request client backed by the GitHub REST API.
pub struct GithubClient {
    tokens: Arc<TokenStore>,
}

impl GithubClient {
    pub fn new(tokens: Arc<TokenStore>) -> Self {
        GithubClient { tokens }
    }

    fn authenticated(&self) -> Result<Octocrab, ApiError> {
        let token = self.tokens.github_token().ok_or(ApiError::MissingToken)?;
        let client = Octocrab::builder().personal_token(token).build()?;
        Ok(client)
    }
}

#[async_trait]
impl PullRequests for GithubClient {
    #[instrument(skip(self, body), fields(repo = %repo_url, head = %head, base = %base))]
    async fn create(
        &self,
        repo_url: &RepoUrl,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<String, ApiError> {
        let (owner, repo) = repo_url.owner_repo()?;
        let client = self.authenticated()?;

        let pull = client
            .pulls(&owner, &repo)
            .create(title, head, base)
            .body(body)
            .send()
            .await?;

        let url = pull
            .html_url
            .map(|u| u.to_string())
            .unwrap_or_else(|| format!("https://github.com/{owner}/{repo}/pull/{}", pull.number));

        info!(pr = %url, "pull request opened");
        Ok(url)
    }
}

impl std::fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubClient").finish_non_exhaustive()
    }
}
