//! The two actor types running on the keyed runtime.
//!
//! Both are keyed by the normalized repository URL, so the router and worker
//! for one repository share a key but live in separate registries:
//!
//! - [`RouterActor`] is the front door. It canonicalizes the incoming work
//!   item and forwards it to the worker registry.
//! - [`WorkerActor`] acknowledges immediately, then runs the full pipeline
//!   before taking its next message. Runs for one repository never overlap;
//!   runs for different repositories proceed in parallel.

mod router;
mod worker;

#[cfg(test)]
mod tests;

pub use router::{RouteError, RouterActor, RouterMessage};
pub use worker::{WorkerActor, WorkerMessage};
