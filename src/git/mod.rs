//! Source-control collaborator: trait, errors, and git subprocess plumbing.
//!
//! The pipeline consumes source control through the [`SourceControl`] trait;
//! the production implementation ([`GitCli`]) shells out to `git` with a
//! clean environment so behavior does not depend on system or user git
//! configuration. Commit identity is passed per-command via `-c` flags, so no
//! persistent `.git/config` changes are required. All subprocess work runs on
//! the blocking thread pool; network operations can take minutes.

mod cli;

pub use cli::GitCli;

use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::RepoUrl;

/// Errors from materializing a repository.
#[derive(Debug, Error)]
pub enum CloneError {
    /// The git command itself failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// The working directory could not be created.
    #[error("failed to create working directory: {0}")]
    Workdir(std::io::Error),
}

/// Errors from enumerating files in a working directory.
#[derive(Debug, Error)]
pub enum EnumerationError {
    #[error("failed to walk working directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Errors from git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Git command failed.
    #[error("git command failed: {command}\nstderr: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// The remote URL could not be parsed as a GitHub repository.
    #[error("unable to parse GitHub remote URL: {remote}")]
    UnparseableRemote { remote: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// Outcome of a commit-and-push attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Changes were committed and the branch was pushed.
    Pushed {
        /// The branch that now exists on the remote.
        branch: String,
    },

    /// Staging produced no changes; nothing was committed or pushed.
    NothingToCommit,
}

/// Identity used for creating commits.
///
/// Passed via `-c` flags so commits work even when global/system git config
/// is disabled.
#[derive(Debug, Clone)]
pub struct CommitIdentity {
    /// The committer/author name (git `user.name`).
    pub name: String,

    /// The committer/author email (git `user.email`).
    pub email: String,
}

/// Source-control operations consumed by the pipeline.
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Materializes `repo_url` at `sha` into a fresh, uniquely named working
    /// directory and returns its path.
    ///
    /// `sha` may be the literal `"HEAD"`, meaning whatever the default branch
    /// points at. On failure no partial working directory is left behind.
    async fn clone_repo(&self, repo_url: &RepoUrl, sha: &str) -> Result<PathBuf, CloneError>;

    /// Returns every file under `work_dir`, excluding version-control
    /// metadata.
    async fn list_files(&self, work_dir: &Path) -> Result<Vec<PathBuf>, EnumerationError>;

    /// Fast-forwards `base_branch`, creates `branch`, stages everything and
    /// commits with `message`, then pushes the new branch.
    ///
    /// Returns [`CommitOutcome::NothingToCommit`] without committing or
    /// pushing when staging produced no changes.
    async fn commit_and_push(
        &self,
        work_dir: &Path,
        branch: &str,
        message: &str,
        base_branch: &str,
    ) -> Result<CommitOutcome, GitError>;
}

/// Create a git Command with clean environment (no system/user config).
///
/// This ensures consistent behavior across machines by ignoring system and
/// user git configuration (rerere, hooks, aliases) and disabling terminal
/// prompts so a missing credential fails instead of hanging.
pub(crate) fn git_command(workdir: &Path) -> std::process::Command {
    use std::process::Command;

    let mut cmd = Command::new("git");
    cmd.current_dir(workdir);

    cmd.env("GIT_CONFIG_NOSYSTEM", "1");
    cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");
    cmd.env("GIT_TERMINAL_PROMPT", "0");

    cmd
}

/// Create a git Command configured for commit operations.
///
/// Extends [`git_command`] with identity configuration passed via `-c` flags;
/// all config is per-command.
pub(crate) fn git_commit_command(
    workdir: &Path,
    identity: &CommitIdentity,
) -> std::process::Command {
    let mut cmd = git_command(workdir);

    cmd.arg("-c");
    cmd.arg(format!("user.name={}", identity.name));
    cmd.arg("-c");
    cmd.arg(format!("user.email={}", identity.email));

    cmd
}

/// Run a git command in the given working directory.
///
/// Returns the command output on success, or a [`GitError`] on failure. The
/// failure message carries the command line with any credential redacted by
/// the caller — never pass a token-bearing argument through `args` without
/// redacting via [`run_git_redacted`].
pub(crate) async fn run_git(workdir: &Path, args: &[&str]) -> GitResult<Output> {
    run_git_redacted(workdir, args, None).await
}

/// Like [`run_git`], but `redact` is removed from the reported command line
/// and stderr if the command fails. Used for token-bearing URLs.
///
/// The subprocess runs on the blocking thread pool: a network clone or push
/// can take minutes, and must not occupy an async worker thread for that
/// long.
pub(crate) async fn run_git_redacted(
    workdir: &Path,
    args: &[&str],
    redact: Option<&str>,
) -> GitResult<Output> {
    let workdir = workdir.to_path_buf();
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    let redact = redact.map(str::to_string);

    tokio::task::spawn_blocking(move || {
        let output = git_command(&workdir).args(&args).output()?;

        if output.status.success() {
            Ok(output)
        } else {
            let mut stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let mut command = format!("git {}", args.join(" "));
            if let Some(secret) = &redact {
                command = command.replace(secret, "***");
                stderr = stderr.replace(secret, "***");
            }
            Err(GitError::CommandFailed { command, stderr })
        }
    })
    .await
    .map_err(|e| GitError::Io(std::io::Error::other(e)))?
}

/// Run a git command and return trimmed stdout as a string.
pub(crate) async fn run_git_stdout(workdir: &Path, args: &[&str]) -> GitResult<String> {
    let output = run_git(workdir, args).await?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
