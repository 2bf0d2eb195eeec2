//! The pipeline run itself.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::git::{CommitOutcome, SourceControl};
use crate::github::PullRequests;
use crate::transform::{Language, TextTransform};
use crate::types::PipelineRequest;

use super::archive::archive_work_dir;
use super::{RunOutcome, RunReport, Stage};

/// Knobs for a pipeline run, fixed at startup.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Branch pull requests are opened against.
    pub base_branch: String,

    /// Prefix for generated branch names; a UTC timestamp is appended.
    pub branch_prefix: String,

    /// Where finished working directories are moved.
    pub archive_dir: PathBuf,
}

/// The clone → transform → commit → pull-request → archive sequence, wired
/// to injected collaborators.
pub struct Pipeline {
    source_control: Arc<dyn SourceControl>,
    transform: Arc<dyn TextTransform>,
    pull_requests: Arc<dyn PullRequests>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        source_control: Arc<dyn SourceControl>,
        transform: Arc<dyn TextTransform>,
        pull_requests: Arc<dyn PullRequests>,
        config: PipelineConfig,
    ) -> Self {
        Pipeline {
            source_control,
            transform,
            pull_requests,
            config,
        }
    }

    /// Runs the full pipeline for one request.
    ///
    /// Never panics and never returns an error: every failure mode is folded
    /// into the returned [`RunReport`], which is also logged here.
    #[instrument(skip(self), fields(repo = %request.repo_url, sha = %request.sha, origin = %request.origin))]
    pub async fn run(&self, request: &PipelineRequest) -> RunReport {
        let work_dir = match self
            .source_control
            .clone_repo(&request.repo_url, &request.sha)
            .await
        {
            Ok(dir) => dir,
            Err(e) => {
                warn!(error = %e, "clone failed, abandoning run");
                return RunReport::failed(Stage::Cloning);
            }
        };

        let report = self.run_in(&work_dir, request).await;

        // The working directory is kept for inspection whether the run
        // succeeded or not.
        archive_work_dir(
            &work_dir,
            &self.config.archive_dir,
            &request.repo_url.repo_name(),
            &request.sha,
        );

        match &report.outcome {
            RunOutcome::Completed { pr_url } => info!(
                pr = %pr_url,
                transformed = report.files_transformed,
                skipped = report.files_skipped,
                failed = report.files_failed,
                "pipeline run complete"
            ),
            RunOutcome::CompletedNoChanges => info!(
                skipped = report.files_skipped,
                failed = report.files_failed,
                "pipeline run complete, no effective changes"
            ),
            RunOutcome::Failed { stage } => warn!(%stage, "pipeline run failed"),
        }

        report
    }

    async fn run_in(&self, work_dir: &Path, request: &PipelineRequest) -> RunReport {
        let files = match self.source_control.list_files(work_dir).await {
            Ok(files) => files,
            Err(e) => {
                warn!(error = %e, "failed to enumerate working directory");
                return RunReport::failed(Stage::Enumerating);
            }
        };

        let mut report = RunReport {
            outcome: RunOutcome::CompletedNoChanges,
            files_transformed: 0,
            files_skipped: 0,
            files_failed: 0,
        };

        for file in &files {
            match self.transform_file(file).await {
                FileResult::Rewritten => report.files_transformed += 1,
                FileResult::Skipped => report.files_skipped += 1,
                FileResult::Failed => report.files_failed += 1,
            }
        }

        info!(
            total = files.len(),
            transformed = report.files_transformed,
            skipped = report.files_skipped,
            failed = report.files_failed,
            "transform pass complete"
        );

        let branch = format!(
            "{}-{}",
            self.config.branch_prefix,
            Utc::now().format("%Y%m%d%H%M%S")
        );
        let message = format!(
            "Automated refactor ({} files rewritten)",
            report.files_transformed
        );

        let outcome = match self
            .source_control
            .commit_and_push(work_dir, &branch, &message, &self.config.base_branch)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "commit and push failed");
                report.outcome = RunOutcome::Failed {
                    stage: Stage::Committing,
                };
                return report;
            }
        };

        match outcome {
            CommitOutcome::NothingToCommit => {
                report.outcome = RunOutcome::CompletedNoChanges;
                report
            }
            CommitOutcome::Pushed { branch } => {
                let title = "Automated refactor".to_string();
                let body = format!(
                    "Automated refactoring pass over `{}` at `{}`.\n\n\
                     {} file(s) rewritten, {} skipped, {} failed to transform.",
                    request.repo_url,
                    request.sha,
                    report.files_transformed,
                    report.files_skipped,
                    report.files_failed,
                );

                match self
                    .pull_requests
                    .create(
                        &request.repo_url,
                        &branch,
                        &self.config.base_branch,
                        &title,
                        &body,
                    )
                    .await
                {
                    Ok(pr_url) => {
                        report.outcome = RunOutcome::Completed { pr_url };
                        report
                    }
                    Err(e) => {
                        warn!(error = %e, "pull request creation failed");
                        report.outcome = RunOutcome::Failed {
                            stage: Stage::CreatingPr,
                        };
                        report
                    }
                }
            }
        }
    }

    /// Transforms one file in place. Unsupported files are skipped; any
    /// failure is contained to this file.
    async fn transform_file(&self, file: &Path) -> FileResult {
        let Some(language) = Language::from_path(file) else {
            return FileResult::Skipped;
        };

        let content = match tokio::fs::read_to_string(file).await {
            Ok(content) => content,
            Err(e) => {
                warn!(file = %file.display(), error = %e, "failed to read file");
                return FileResult::Failed;
            }
        };

        let rewritten = match self.transform.transform(language, &content).await {
            Ok(rewritten) => rewritten,
            Err(e) => {
                warn!(file = %file.display(), error = %e, "transform failed for file");
                return FileResult::Failed;
            }
        };

        if rewritten == content {
            return FileResult::Skipped;
        }

        match tokio::fs::write(file, &rewritten).await {
            Ok(()) => FileResult::Rewritten,
            Err(e) => {
                warn!(file = %file.display(), error = %e, "failed to write file");
                FileResult::Failed
            }
        }
    }
}

enum FileResult {
    Rewritten,
    Skipped,
    Failed,
}
