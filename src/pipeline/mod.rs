//! The refactoring pipeline: clone, transform, commit, pull request, archive.
//!
//! The pipeline is a straight-line run over injected collaborators. Failure
//! handling is per-domain:
//!
//! - clone failure aborts the run (there is nothing to work on);
//! - each file transform is isolated — one bad file is logged and skipped;
//! - a repository with no effective changes ends the run successfully with
//!   no commit and no pull request;
//! - commit/push and pull-request failures end the run as failed but never
//!   panic or poison the worker;
//! - archiving is best-effort and cannot fail the run.

mod archive;
mod run;

pub use run::{Pipeline, PipelineConfig};

use serde::Serialize;

/// Stages of a pipeline run, in execution order. Used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Cloning,
    Enumerating,
    Transforming,
    Committing,
    CreatingPr,
    Archiving,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Cloning => "cloning",
            Stage::Enumerating => "enumerating",
            Stage::Transforming => "transforming",
            Stage::Committing => "committing",
            Stage::CreatingPr => "creating_pr",
            Stage::Archiving => "archiving",
        };
        write!(f, "{s}")
    }
}

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A branch was pushed and a pull request opened.
    Completed { pr_url: String },

    /// The run finished but every transform left its file unchanged (or
    /// failed), so nothing was committed.
    CompletedNoChanges,

    /// The run stopped at the named stage.
    Failed { stage: Stage },
}

/// Summary of one pipeline run. Logged at the end of the run; callers of the
/// worker never see it.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub files_transformed: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
}

impl RunReport {
    pub(crate) fn failed(stage: Stage) -> Self {
        RunReport {
            outcome: RunOutcome::Failed { stage },
            files_transformed: 0,
            files_skipped: 0,
            files_failed: 0,
        }
    }
}
