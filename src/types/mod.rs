//! Core domain types for the refactor bot.
//!
//! This module contains the fundamental types used throughout the application,
//! designed to encode invariants via the type system.

pub mod repo;
pub mod work;

// Re-export commonly used types at the module level
pub use repo::{InvalidRepoUrl, RepoUrl};
pub use work::{PipelineRequest, PipelineResult, RepoWorkItem, RunStatus, WorkKind};
