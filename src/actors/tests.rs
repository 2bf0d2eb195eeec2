//! End-to-end actor scenarios over fake collaborators.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use crate::pipeline::{Pipeline, PipelineConfig};
use crate::runtime::{ActorKey, Registry, RegistryConfig};
use crate::test_utils::{FakePullRequests, FakeSourceControl, FakeTransform};
use crate::types::{RepoUrl, RepoWorkItem, RunStatus, WorkKind};

use super::{RouterActor, RouterMessage, WorkerActor};

struct Harness {
    _dir: TempDir,
    archive_dir: PathBuf,
    source: Arc<FakeSourceControl>,
    prs: Arc<FakePullRequests>,
    workers: Arc<Registry<WorkerActor>>,
    routers: Arc<Registry<RouterActor>>,
}

impl Harness {
    fn new(files: &[(&str, &str)], transform: FakeTransform) -> Self {
        let dir = TempDir::new().unwrap();
        Self::build(
            dir,
            |base| Arc::new(FakeSourceControl::new(base, files)),
            transform,
        )
    }

    fn with_failing_clone() -> Self {
        let dir = TempDir::new().unwrap();
        Self::build(
            dir,
            |base| Arc::new(FakeSourceControl::failing_clone(base)),
            FakeTransform::echo(),
        )
    }

    fn build(
        dir: TempDir,
        make_source: impl FnOnce(&Path) -> Arc<FakeSourceControl>,
        transform: FakeTransform,
    ) -> Self {
        let source = make_source(dir.path());
        let prs = Arc::new(FakePullRequests::new("https://github.com/o/fixture/pull/9"));
        let archive_dir = dir.path().join("archive");

        let pipeline = Arc::new(Pipeline::new(
            source.clone(),
            Arc::new(transform),
            prs.clone(),
            PipelineConfig {
                base_branch: "main".to_string(),
                branch_prefix: "bot".to_string(),
                archive_dir: archive_dir.clone(),
            },
        ));

        let workers = Arc::new(Registry::new(RegistryConfig::default(), move |_key| {
            WorkerActor::new(Arc::clone(&pipeline))
        }));
        let routers = {
            let workers = Arc::clone(&workers);
            Arc::new(Registry::new(RegistryConfig::default(), move |_key| {
                RouterActor::new(Arc::clone(&workers))
            }))
        };

        Harness {
            _dir: dir,
            archive_dir,
            source,
            prs,
            workers,
            routers,
        }
    }

    /// Dispatches a work item the way the boundary does: keyed by the
    /// normalized repository URL.
    async fn enqueue(&self, repo_url: &str, sha: &str, kind: WorkKind) -> RunStatus {
        let item = RepoWorkItem {
            repo_url: RepoUrl::new(repo_url),
            branch: "main".to_string(),
            sha: sha.to_string(),
            kind,
        };
        let key = ActorKey::new(item.repo_url.normalize().as_str());
        let result = self
            .routers
            .dispatch(&key, RouterMessage::Enqueue(item))
            .await
            .expect("routing should succeed");
        result.status
    }

    /// The directory a finished run for this repo/sha archives into.
    fn archive_of(&self, repo_name: &str, sha: &str) -> PathBuf {
        self.archive_dir.join(repo_name).join(sha)
    }
}

/// Polls until `condition` holds, failing the test after two seconds.
async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn enqueue_acknowledges_started() {
    let h = Harness::new(&[("a.py", "print('x')\n")], FakeTransform::new("y\n"));

    let status = h
        .enqueue("https://github.com/o/fixture", "", WorkKind::Manual)
        .await;
    assert_eq!(status, RunStatus::Started);
}

#[tokio::test]
async fn mixed_repo_ends_in_one_rewrite_and_one_pr() {
    let h = Harness::new(
        &[
            ("notes.md", "# notes\n"),
            ("broken.py", "raise\n"),
            ("good.py", "print('x')\n"),
        ],
        FakeTransform::new("improved\n").failing_on("raise"),
    );

    h.enqueue("https://github.com/o/fixture", "", WorkKind::Push)
        .await;
    wait_until("the pull request", || h.prs.created().len() == 1).await;

    assert_eq!(h.source.pushed_branches().len(), 1);
    let archived = h.archive_of("fixture", "HEAD");
    wait_until("the archive", || archived.exists()).await;
    assert_eq!(
        std::fs::read_to_string(archived.join("good.py")).unwrap(),
        "improved\n"
    );
    // The unsupported and failing files are untouched.
    assert_eq!(
        std::fs::read_to_string(archived.join("notes.md")).unwrap(),
        "# notes\n"
    );
    assert_eq!(
        std::fs::read_to_string(archived.join("broken.py")).unwrap(),
        "raise\n"
    );
}

#[tokio::test]
async fn clone_failure_still_acks_but_pushes_nothing() {
    let h = Harness::with_failing_clone();

    let status = h
        .enqueue("https://github.com/o/fixture", "", WorkKind::Manual)
        .await;
    assert_eq!(status, RunStatus::Started);

    wait_until("the clone attempt", || !h.source.cloned_shas().is_empty()).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(h.source.pushed_branches().is_empty());
    assert!(h.prs.created().is_empty());
    assert!(h.source.last_work_dir().is_none(), "no workdir should exist");
}

#[tokio::test]
async fn unchanged_repo_opens_no_pull_request() {
    let h = Harness::new(&[("same.py", "print('x')\n")], FakeTransform::echo());

    h.enqueue("https://github.com/o/fixture", "", WorkKind::Manual)
        .await;
    let archived = h.archive_of("fixture", "HEAD");
    wait_until("the run to finish", || archived.exists()).await;

    assert!(h.source.pushed_branches().is_empty());
    assert!(h.prs.created().is_empty());
}

#[tokio::test]
async fn url_spellings_share_one_worker_and_blank_sha_becomes_head() {
    let h = Harness::new(&[("a.py", "print('x')\n")], FakeTransform::echo());

    h.enqueue(
        "https://github.com/o/fixture/tree/main/src",
        "",
        WorkKind::Push,
    )
    .await;
    h.enqueue("https://github.com/o/fixture/", "abc123", WorkKind::Manual)
        .await;

    wait_until("both clones", || h.source.cloned_shas().len() == 2).await;
    assert_eq!(h.source.cloned_shas(), vec!["HEAD", "abc123"]);

    // One router and one worker, despite three distinct URL spellings.
    assert_eq!(h.routers.active_count().await, 1);
    assert_eq!(h.workers.active_count().await, 1);
}

#[tokio::test]
async fn ack_is_fast_even_when_the_transform_is_slow() {
    let h = Harness::new(
        &[("slow.py", "print('x')\n")],
        FakeTransform::new("improved\n").with_delay(Duration::from_millis(500)),
    );

    let started = Instant::now();
    let status = h
        .enqueue("https://github.com/o/fixture", "", WorkKind::Manual)
        .await;
    assert_eq!(status, RunStatus::Started);
    assert!(
        started.elapsed() < Duration::from_millis(250),
        "acknowledgment must not wait for the pipeline"
    );
}

#[tokio::test]
async fn runs_for_one_repo_are_serialized() {
    let h = Harness::new(
        &[("a.py", "print('x')\n")],
        FakeTransform::new("improved\n").with_delay(Duration::from_millis(100)),
    );

    h.enqueue("https://github.com/o/fixture", "", WorkKind::Push)
        .await;
    h.enqueue("https://github.com/o/fixture", "", WorkKind::Push)
        .await;

    wait_until("both runs", || h.prs.created().len() == 2).await;

    // Two complete, non-overlapping runs: each cloned, pushed, and opened
    // its own pull request.
    assert_eq!(h.source.cloned_shas().len(), 2);
    assert_eq!(h.source.pushed_branches().len(), 2);
}
