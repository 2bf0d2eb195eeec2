//! The actor contract: keys, handlers, and the reply handle.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::oneshot;

/// Identity of a logical actor instance within one registry.
///
/// Keys are arbitrary strings; the caller is responsible for canonicalizing
/// them (two spellings of one identity must map to one key string, or they
/// will address two different instances).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorKey(String);

impl ActorKey {
    pub fn new(s: impl Into<String>) -> Self {
        ActorKey(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ActorKey {
    fn from(s: String) -> Self {
        ActorKey(s)
    }
}

impl From<&str> for ActorKey {
    fn from(s: &str) -> Self {
        ActorKey(s.to_string())
    }
}

/// One-shot reply handle passed to a message handler.
///
/// The handler must send exactly one reply. Sending consumes the handle;
/// dropping it without replying surfaces as
/// [`DispatchError::ReplyDropped`](super::DispatchError::ReplyDropped) at the
/// dispatching caller.
///
/// Replying does not end the handler: a handler may reply first and keep
/// working, which resumes the caller immediately while the instance's mailbox
/// stays blocked until the handler returns.
pub struct Reply<T, E> {
    tx: oneshot::Sender<Result<T, E>>,
}

impl<T, E> Reply<T, E> {
    pub(crate) fn new(tx: oneshot::Sender<Result<T, E>>) -> Self {
        Reply { tx }
    }

    /// Sends the reply, resuming the dispatching caller.
    ///
    /// If the caller has gone away (e.g. its task was dropped) the reply is
    /// discarded; the handler keeps running either way.
    pub fn send(self, result: Result<T, E>) {
        let _ = self.tx.send(result);
    }

    /// Shorthand for `send(Ok(value))`.
    pub fn ok(self, value: T) {
        self.send(Ok(value));
    }

    /// Shorthand for `send(Err(error))`.
    pub fn err(self, error: E) {
        self.send(Err(error));
    }
}

impl<T, E> fmt::Debug for Reply<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply").finish_non_exhaustive()
    }
}

/// A keyed actor: per-key state plus a serialized message handler.
///
/// One value of the implementing type is created per active key (via the
/// factory given to [`Registry::new`](super::Registry::new)) and owns all
/// mutable state for that key. The runtime guarantees `handle` is never
/// invoked concurrently for one instance, so no locking is needed inside.
#[async_trait]
pub trait Actor: Send + 'static {
    /// Messages this actor accepts.
    type Message: Send + 'static;

    /// Successful reply value.
    type Reply: Send + 'static;

    /// Per-message failure surfaced to the dispatching caller only; the
    /// instance itself survives handler errors.
    type Error: std::error::Error + Send + 'static;

    /// Handles one message.
    ///
    /// The handler should reply through `reply` (possibly early, see
    /// [`Reply`]); whatever it does after replying still blocks the mailbox.
    async fn handle(&mut self, message: Self::Message, reply: Reply<Self::Reply, Self::Error>);
}
