//! Registry of live clients, owned by the hub control loop.
//!
//! [`ClientRegistry`] is a plain `HashMap` with no interior locking. It is
//! only ever touched from inside the control loop, which processes one
//! command at a time, so every read and write is already serialized.
//! Per-user and per-role views are derived by scanning the map on demand.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::domain::{ClientId, HubMessage, HubStats, Identity, Scope};
use crate::ws::{ClientState, Lifecycle};

/// Receiving half of a client's outbound queue.
pub type ClientQueue = mpsc::Receiver<Arc<HubMessage>>;

/// The hub's view of one registered client.
///
/// Holds the only sender of the client's outbound queue. Dropping the
/// handle closes the queue and moves the client's [`Lifecycle`] to
/// `Draining`, which is how unregistration (explicit, by eviction, or on
/// shutdown) tells both pumps to stop without flushing what is buffered.
#[derive(Debug)]
pub struct ClientHandle {
    id: ClientId,
    identity: Identity,
    sender: mpsc::Sender<Arc<HubMessage>>,
    lifecycle: Lifecycle,
}

impl ClientHandle {
    /// Creates a handle and the matching bounded queue, with a lifecycle
    /// nobody else observes.
    ///
    /// `capacity` is clamped to at least one slot.
    #[must_use]
    pub fn new(id: ClientId, identity: Identity, capacity: usize) -> (Self, ClientQueue) {
        Self::with_lifecycle(id, identity, capacity, Lifecycle::new())
    }

    /// Creates a handle bound to a running client's `lifecycle`.
    #[must_use]
    pub fn with_lifecycle(
        id: ClientId,
        identity: Identity,
        capacity: usize,
        lifecycle: Lifecycle,
    ) -> (Self, ClientQueue) {
        let (sender, queue) = mpsc::channel(capacity.max(1));
        (
            Self {
                id,
                identity,
                sender,
                lifecycle,
            },
            queue,
        )
    }

    /// Returns the client identifier.
    #[must_use]
    pub const fn id(&self) -> ClientId {
        self.id
    }

    /// Returns the authenticated identity.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Returns `true` if this client is selected by `scope`.
    #[must_use]
    pub fn matches(&self, scope: &Scope) -> bool {
        match scope {
            Scope::Broadcast => true,
            Scope::ToUser(user_id) => self.identity.user_id == *user_id,
            Scope::ToRole(role) => self.identity.has_role(role),
        }
    }

    /// Pushes a message without waiting.
    ///
    /// # Errors
    ///
    /// Fails if the queue is full or its receiver is gone.
    pub fn try_push(
        &self,
        message: Arc<HubMessage>,
    ) -> Result<(), TrySendError<Arc<HubMessage>>> {
        self.sender.try_send(message)
    }
}

impl Drop for ClientHandle {
    fn drop(&mut self) {
        self.lifecycle.advance(ClientState::Draining);
    }
}

/// Outcome of one [`ClientRegistry::deliver`] call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Clients the message was queued for.
    pub delivered: usize,
    /// Clients removed because their queue was full or closed.
    pub evicted: Vec<ClientId>,
}

/// Map of live clients keyed by [`ClientId`].
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<ClientId, ClientHandle>,
}

impl ClientRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a client, returning the entry it replaced, if any.
    pub fn insert(&mut self, handle: ClientHandle) -> Option<ClientHandle> {
        self.clients.insert(handle.id, handle)
    }

    /// Removes a client. Returns `None` if it was not registered.
    pub fn remove(&mut self, id: &ClientId) -> Option<ClientHandle> {
        self.clients.remove(id)
    }

    /// Returns `true` if the client is registered.
    #[must_use]
    pub fn contains(&self, id: &ClientId) -> bool {
        self.clients.contains_key(id)
    }

    /// Iterates over the clients selected by `scope`.
    pub fn targets<'a>(&'a self, scope: &'a Scope) -> impl Iterator<Item = &'a ClientHandle> {
        self.clients.values().filter(move |c| c.matches(scope))
    }

    /// Queues `message` for every client selected by `scope`.
    ///
    /// Never waits. A client whose queue rejects the push is removed
    /// from the registry on the spot, which drops its handle and closes
    /// its queue.
    pub fn deliver(&mut self, message: &Arc<HubMessage>, scope: &Scope) -> Delivery {
        let mut delivery = Delivery::default();
        for client in self.targets(scope) {
            match client.try_push(Arc::clone(message)) {
                Ok(()) => delivery.delivered += 1,
                Err(err) => {
                    let reason = match err {
                        TrySendError::Full(_) => "queue full",
                        TrySendError::Closed(_) => "queue closed",
                    };
                    tracing::warn!(
                        client_id = %client.id,
                        user_id = client.identity.user_id,
                        reason,
                        "evicting unresponsive client"
                    );
                    delivery.evicted.push(client.id);
                }
            }
        }
        for id in &delivery.evicted {
            self.clients.remove(id);
        }
        delivery
    }

    /// Builds a snapshot of the registry.
    #[must_use]
    pub fn stats(&self) -> HubStats {
        let mut stats = HubStats {
            total_clients: self.clients.len(),
            ..HubStats::default()
        };
        for client in self.clients.values() {
            *stats
                .counts_by_role
                .entry(client.identity.role.clone())
                .or_insert(0) += 1;
        }
        stats
    }

    /// Removes every client, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.clients.len();
        self.clients.clear();
        count
    }

    /// Returns the number of registered clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns `true` if no clients are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
