//! Refactor Bot - an automated refactoring service for GitHub repositories.
//!
//! Work arrives over HTTP (webhooks or manual triggers), is routed through
//! per-repository actors, and ends as a pull request containing
//! model-rewritten source files.

pub mod actors;
pub mod config;
pub mod git;
pub mod github;
pub mod pipeline;
pub mod runtime;
pub mod server;
pub mod transform;
pub mod types;

#[cfg(test)]
pub mod test_utils;
