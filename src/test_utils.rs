//! Shared fakes for pipeline and actor tests.
//!
//! Each fake implements one collaborator trait with scripted behavior and
//! records the calls it receives, so tests can assert both on outcomes and
//! on what was (or was not) attempted.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::git::{CloneError, CommitOutcome, EnumerationError, GitError, SourceControl};
use crate::github::{ApiError, PullRequests};
use crate::transform::{Language, TextTransform, TransformError};
use crate::types::RepoUrl;

/// Source control over plain directories: "cloning" materializes a fixed set
/// of fixture files, and "pushing" succeeds iff anything on disk differs
/// from those fixtures.
pub struct FakeSourceControl {
    base: PathBuf,
    files: Vec<(String, String)>,
    fail_clone: bool,
    counter: AtomicUsize,
    cloned_shas: Mutex<Vec<String>>,
    work_dirs: Mutex<Vec<PathBuf>>,
    pushed: Mutex<Vec<String>>,
}

impl FakeSourceControl {
    pub fn new(base: &Path, files: &[(&str, &str)]) -> Self {
        FakeSourceControl {
            base: base.to_path_buf(),
            files: files
                .iter()
                .map(|(name, content)| (name.to_string(), content.to_string()))
                .collect(),
            fail_clone: false,
            counter: AtomicUsize::new(0),
            cloned_shas: Mutex::new(Vec::new()),
            work_dirs: Mutex::new(Vec::new()),
            pushed: Mutex::new(Vec::new()),
        }
    }

    /// A source control whose clone always fails.
    pub fn failing_clone(base: &Path) -> Self {
        FakeSourceControl {
            fail_clone: true,
            ..FakeSourceControl::new(base, &[])
        }
    }

    /// Branches that were "pushed", in order.
    pub fn pushed_branches(&self) -> Vec<String> {
        self.pushed.lock().unwrap().clone()
    }

    /// Shas requested across all clones, in order.
    pub fn cloned_shas(&self) -> Vec<String> {
        self.cloned_shas.lock().unwrap().clone()
    }

    /// The most recent working directory handed out by `clone_repo`.
    pub fn last_work_dir(&self) -> Option<PathBuf> {
        self.work_dirs.lock().unwrap().last().cloned()
    }

    /// True when any file on disk differs from the cloned fixtures.
    fn has_changes(&self, work_dir: &Path) -> bool {
        let fixtures: BTreeMap<_, _> = self.files.iter().cloned().collect();
        let mut seen = 0;

        for entry in WalkDir::new(work_dir).into_iter().flatten() {
            if !entry.file_type().is_file() {
                continue;
            }
            seen += 1;
            let rel = entry
                .path()
                .strip_prefix(work_dir)
                .expect("entry under work_dir")
                .to_string_lossy()
                .to_string();
            let on_disk = std::fs::read_to_string(entry.path()).unwrap_or_default();
            if fixtures.get(&rel) != Some(&on_disk) {
                return true;
            }
        }

        seen != fixtures.len()
    }
}

#[async_trait]
impl SourceControl for FakeSourceControl {
    async fn clone_repo(&self, _repo_url: &RepoUrl, sha: &str) -> Result<PathBuf, CloneError> {
        self.cloned_shas.lock().unwrap().push(sha.to_string());

        if self.fail_clone {
            return Err(CloneError::Git(GitError::CommandFailed {
                command: "git clone".to_string(),
                stderr: "fatal: repository not found".to_string(),
            }));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let work_dir = self.base.join(format!("work-{n}"));
        for (name, content) in &self.files {
            let path = work_dir.join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(CloneError::Workdir)?;
            }
            std::fs::write(&path, content).map_err(CloneError::Workdir)?;
        }
        std::fs::create_dir_all(&work_dir).map_err(CloneError::Workdir)?;

        self.work_dirs.lock().unwrap().push(work_dir.clone());
        Ok(work_dir)
    }

    async fn list_files(&self, work_dir: &Path) -> Result<Vec<PathBuf>, EnumerationError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(work_dir) {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    async fn commit_and_push(
        &self,
        work_dir: &Path,
        branch: &str,
        _message: &str,
        _base_branch: &str,
    ) -> Result<CommitOutcome, GitError> {
        if !self.has_changes(work_dir) {
            return Ok(CommitOutcome::NothingToCommit);
        }
        self.pushed.lock().unwrap().push(branch.to_string());
        Ok(CommitOutcome::Pushed {
            branch: branch.to_string(),
        })
    }
}

/// Transform with scripted output, optional per-content failure, and an
/// optional artificial delay.
pub struct FakeTransform {
    output: Option<String>,
    fail_on: Option<String>,
    delay: Option<Duration>,
}

impl FakeTransform {
    /// Always returns `output` (for any input).
    pub fn new(output: impl Into<String>) -> Self {
        FakeTransform {
            output: Some(output.into()),
            fail_on: None,
            delay: None,
        }
    }

    /// Returns its input unchanged.
    pub fn echo() -> Self {
        FakeTransform {
            output: None,
            fail_on: None,
            delay: None,
        }
    }

    /// Fails any transform whose input contains `needle`.
    pub fn failing_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on = Some(needle.into());
        self
    }

    /// Sleeps before answering, to simulate a slow model.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl TextTransform for FakeTransform {
    async fn transform(
        &self,
        _language: Language,
        content: &str,
    ) -> Result<String, TransformError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(needle) = &self.fail_on
            && content.contains(needle)
        {
            return Err(TransformError::Backend {
                stderr: "scripted failure".to_string(),
            });
        }

        Ok(match &self.output {
            Some(output) => output.clone(),
            None => content.to_string(),
        })
    }
}

/// One recorded pull-request creation.
#[derive(Debug, Clone)]
pub struct CreatedPr {
    pub repo_url: RepoUrl,
    pub head: String,
    pub base: String,
    pub title: String,
    pub body: String,
}

/// Pull-request client that records calls and answers with a fixed URL.
pub struct FakePullRequests {
    url: String,
    fail: bool,
    created: Mutex<Vec<CreatedPr>>,
}

impl FakePullRequests {
    pub fn new(url: impl Into<String>) -> Self {
        FakePullRequests {
            url: url.into(),
            fail: false,
            created: Mutex::new(Vec::new()),
        }
    }

    /// A client whose every call fails.
    pub fn failing() -> Self {
        FakePullRequests {
            fail: true,
            ..FakePullRequests::new("unused")
        }
    }

    /// Pull requests created so far, in order.
    pub fn created(&self) -> Vec<CreatedPr> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl PullRequests for FakePullRequests {
    async fn create(
        &self,
        repo_url: &RepoUrl,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<String, ApiError> {
        if self.fail {
            return Err(ApiError::MissingToken);
        }
        self.created.lock().unwrap().push(CreatedPr {
            repo_url: repo_url.clone(),
            head: head.to_string(),
            base: base.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(self.url.clone())
    }
}
