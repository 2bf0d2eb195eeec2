//! The keyed registry: activation, dispatch, and deactivation.
//!
//! The registry holds one handle per active key under an async `RwLock`,
//! taken only for lookup and insertion — never while a message is being
//! handled. Activation uses a read-then-write double check so that
//! concurrent dispatchers for a fresh key agree on a single instance.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{RwLock, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::actor::{Actor, ActorKey, Reply};

/// Default idle period after which an instance with an empty mailbox
/// deactivates.
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Mailbox buffer size per instance.
const MAILBOX_CAPACITY: usize = 100;

/// Errors surfaced to a caller of [`Registry::dispatch`].
///
/// Only the synchronous dispatch path reports errors; anything an actor does
/// after replying is invisible to callers.
#[derive(Debug, Error)]
pub enum DispatchError<E: std::error::Error> {
    /// The handler failed for this one message. The instance stays alive and
    /// continues with its queue.
    #[error("handler error: {0}")]
    Handler(E),

    /// The handler finished without sending a reply.
    #[error("actor dropped the reply channel")]
    ReplyDropped,

    /// The registry has been shut down.
    #[error("actor registry is shutting down")]
    ShuttingDown,
}

/// Tuning knobs for a registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Idle period after which an instance with an empty mailbox deactivates.
    pub idle_timeout: Duration,

    /// Mailbox buffer size per instance.
    pub mailbox_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            mailbox_capacity: MAILBOX_CAPACITY,
        }
    }
}

/// A message plus the channel its reply travels back on.
struct Envelope<A: Actor> {
    message: A::Message,
    reply: oneshot::Sender<Result<A::Reply, A::Error>>,
}

/// Registry-side handle to one live instance.
///
/// The generation disambiguates instances that reuse a key: a dispatcher that
/// observed a closed mailbox evicts the entry only if it still belongs to the
/// instance it talked to.
struct ActorHandle<A: Actor> {
    tx: mpsc::Sender<Envelope<A>>,
    generation: u64,
}

type ActorMap<A> = Arc<RwLock<HashMap<ActorKey, ActorHandle<A>>>>;

/// Keyed single-activation registry for one actor type.
///
/// Guarantees at most one live instance per key, FIFO handling within an
/// instance, and full concurrency across instances. See the module docs of
/// [`crate::runtime`] for the lifecycle.
pub struct Registry<A: Actor> {
    factory: Box<dyn Fn(&ActorKey) -> A + Send + Sync>,
    actors: ActorMap<A>,
    config: RegistryConfig,
    shutdown: CancellationToken,
    next_generation: AtomicU64,
}

impl<A: Actor> Registry<A> {
    /// Creates a registry whose instances are built by `factory`.
    ///
    /// The factory runs under the registry's write lock and should therefore
    /// be cheap; anything expensive belongs in the actor's first message.
    pub fn new(
        config: RegistryConfig,
        factory: impl Fn(&ActorKey) -> A + Send + Sync + 'static,
    ) -> Self {
        Registry {
            factory: Box::new(factory),
            actors: Arc::new(RwLock::new(HashMap::new())),
            config,
            shutdown: CancellationToken::new(),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Creates a registry that deactivates idle instances under a shared
    /// shutdown token.
    pub fn with_shutdown(
        config: RegistryConfig,
        shutdown: CancellationToken,
        factory: impl Fn(&ActorKey) -> A + Send + Sync + 'static,
    ) -> Self {
        Registry {
            factory: Box::new(factory),
            actors: Arc::new(RwLock::new(HashMap::new())),
            config,
            shutdown,
            next_generation: AtomicU64::new(0),
        }
    }

    /// Sends `message` to the instance for `key` and suspends until the
    /// handler replies.
    ///
    /// Activates the instance if the key has none. Messages from concurrent
    /// dispatchers to the same key are handled one at a time in the order the
    /// mailbox received them; no ordering holds across keys.
    pub async fn dispatch(
        &self,
        key: &ActorKey,
        message: A::Message,
    ) -> Result<A::Reply, DispatchError<A::Error>> {
        let mut message = message;
        loop {
            if self.shutdown.is_cancelled() {
                return Err(DispatchError::ShuttingDown);
            }

            let (tx, generation) = self.get_or_activate(key).await;
            let (reply_tx, reply_rx) = oneshot::channel();

            match tx
                .send(Envelope {
                    message,
                    reply: reply_tx,
                })
                .await
            {
                Ok(()) => {
                    return match reply_rx.await {
                        Ok(result) => result.map_err(DispatchError::Handler),
                        Err(_) => Err(DispatchError::ReplyDropped),
                    };
                }
                Err(mpsc::error::SendError(envelope)) => {
                    // The instance deactivated between lookup and send; evict
                    // the stale handle and re-activate.
                    trace!(key = %key, "mailbox closed mid-dispatch, re-activating");
                    message = envelope.message;
                    self.evict(key, generation).await;
                }
            }
        }
    }

    /// Returns the instance's mailbox, activating it if needed.
    async fn get_or_activate(&self, key: &ActorKey) -> (mpsc::Sender<Envelope<A>>, u64) {
        // Fast path: instance already live (read lock).
        {
            let actors = self.actors.read().await;
            if let Some(handle) = actors.get(key) {
                return (handle.tx.clone(), handle.generation);
            }
        }

        let mut actors = self.actors.write().await;

        // Double-check after acquiring the write lock: a concurrent caller
        // may have activated the instance while we waited.
        if let Some(handle) = actors.get(key) {
            return (handle.tx.clone(), handle.generation);
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, generation, "activating actor instance");

        let actor = (self.factory)(key);
        let (tx, rx) = mpsc::channel(self.config.mailbox_capacity);

        tokio::spawn(actor_loop(
            actor,
            rx,
            key.clone(),
            generation,
            self.config.idle_timeout,
            self.shutdown.child_token(),
            Arc::clone(&self.actors),
        ));

        actors.insert(
            key.clone(),
            ActorHandle {
                tx: tx.clone(),
                generation,
            },
        );

        (tx, generation)
    }

    /// Removes the registry entry for `key` if it still belongs to
    /// `generation`.
    async fn evict(&self, key: &ActorKey, generation: u64) {
        let mut actors = self.actors.write().await;
        if actors.get(key).map(|h| h.generation) == Some(generation) {
            actors.remove(key);
        }
    }

    /// Number of currently live instances.
    pub async fn active_count(&self) -> usize {
        self.actors.read().await.len()
    }

    /// Whether an instance is currently live for `key`.
    pub async fn is_active(&self, key: &ActorKey) -> bool {
        self.actors.read().await.contains_key(key)
    }

    /// Returns the registry's shutdown token.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Begins shutdown: rejects new dispatches and asks every live instance
    /// to finish its current message and exit.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// The per-instance event loop.
///
/// Runs until shutdown or an idle timeout, then performs the deactivation
/// protocol: close the mailbox (so senders start failing over to
/// re-activation), handle every envelope that was already buffered, and
/// finally drop the registry entry — but only if it still points here.
async fn actor_loop<A: Actor>(
    mut actor: A,
    mut rx: mpsc::Receiver<Envelope<A>>,
    key: ActorKey,
    generation: u64,
    idle_timeout: Duration,
    cancel: CancellationToken,
    actors: ActorMap<A>,
) {
    loop {
        let envelope = tokio::select! {
            _ = cancel.cancelled() => break,
            received = tokio::time::timeout(idle_timeout, rx.recv()) => match received {
                Ok(Some(envelope)) => envelope,
                // All senders dropped (registry gone).
                Ok(None) => break,
                // Idle with an empty mailbox: deactivate.
                Err(_) => {
                    debug!(key = %key, generation, "actor idle, deactivating");
                    break;
                }
            },
        };

        actor
            .handle(envelope.message, Reply::new(envelope.reply))
            .await;
    }

    // No envelope may be lost to deactivation: refuse new ones first, then
    // handle whatever was already buffered.
    rx.close();
    while let Some(envelope) = rx.recv().await {
        actor
            .handle(envelope.message, Reply::new(envelope.reply))
            .await;
    }

    let mut actors = actors.write().await;
    if actors.get(&key).map(|h| h.generation) == Some(generation) {
        actors.remove(&key);
    }
    debug!(key = %key, generation, "actor instance deactivated");
}
