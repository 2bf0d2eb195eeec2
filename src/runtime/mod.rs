//! Keyed single-activation actor runtime.
//!
//! The runtime maps an arbitrary string key to exactly one live instance of
//! an actor type, creating instances on demand when the first message for a
//! key arrives. Messages to one instance are strictly serialized; different
//! instances run fully concurrently.
//!
//! # Architecture
//!
//! ```text
//!                                        ┌───────────────────────────────┐
//!                                   ┌──► │  mailbox for key A (FIFO)     │ ──► actor A
//!                                   │    └───────────────────────────────┘
//! ┌──────────────┐   ┌──────────┐   │
//! │  dispatch()  │ ─►│ registry │ ──┤    ┌───────────────────────────────┐
//! │  (suspends)  │   │  by key  │   └──► │  mailbox for key B (FIFO)     │ ──► actor B
//! └──────────────┘   └──────────┘        └───────────────────────────────┘
//! ```
//!
//! # Instance Lifecycle
//!
//! An instance is activated by the first [`Registry::dispatch`] for its key
//! and runs as a tokio task with a private mailbox. After an idle period with
//! an empty mailbox it deactivates: it closes the mailbox, handles anything
//! that raced in, and removes itself from the registry. A dispatch that loses
//! this race observes a closed mailbox and transparently re-activates, so
//! callers never see deactivation and no message is ever dropped by it.
//!
//! # Replies
//!
//! Handlers answer through a [`Reply`] handle and may answer *early*: the
//! caller of `dispatch` is resumed the moment the reply is sent, while the
//! handler keeps running. The mailbox does not advance until the handler
//! returns, so everything a handler does after replying is still serialized
//! against later messages for the same key.

mod actor;
mod registry;

pub use actor::{Actor, ActorKey, Reply};
pub use registry::{DispatchError, Registry, RegistryConfig};
