//! The hub actor: a cloneable handle plus the single control loop.
//!
//! [`Hub`] is what the rest of the process holds. Each method turns into a
//! [`HubCommand`] sent over a bounded channel to the control loop spawned
//! by [`Hub::spawn`], which exclusively owns the [`ClientRegistry`].

use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::command::HubCommand;
use super::registry::{ClientHandle, ClientRegistry, Delivery};
use crate::domain::{ClientId, EventType, HubMessage, HubStats, Scope};
use crate::error::HubError;

/// Cloneable handle to the hub control loop.
///
/// Calls that do not need an answer (`register`, `unregister`,
/// `broadcast`) never fail: if the loop has already stopped they log and
/// return. Calls that need an answer return [`HubError::HubUnavailable`]
/// in that case.
#[derive(Debug, Clone)]
pub struct Hub {
    commands: mpsc::Sender<HubCommand>,
}

impl Hub {
    /// Spawns the control loop on the current Tokio runtime.
    ///
    /// `control_capacity` bounds the command inbox; producers wait for a
    /// free slot when it is full.
    #[must_use]
    pub fn spawn(control_capacity: usize) -> (Self, JoinHandle<()>) {
        let (commands, inbox) = mpsc::channel(control_capacity.max(1));
        let control = ControlLoop {
            registry: ClientRegistry::new(),
            inbox,
        };
        let task = tokio::spawn(control.run());
        (Self { commands }, task)
    }

    /// Adds a client to the registry, replacing any entry with the same id.
    pub async fn register(&self, handle: ClientHandle) {
        self.submit(HubCommand::Register(handle)).await;
    }

    /// Removes a client from the registry. Unknown ids are ignored.
    pub async fn unregister(&self, id: ClientId) {
        self.submit(HubCommand::Unregister(id)).await;
    }

    /// Queues `message` for every client selected by `scope`.
    ///
    /// Fire-and-forget: returns once the control loop has accepted the
    /// request, not once clients have been written to.
    pub async fn broadcast(&self, message: HubMessage, scope: Scope) {
        self.submit(HubCommand::Broadcast {
            message: Arc::new(message),
            scope,
            reply: None,
        })
        .await;
    }

    /// Like [`Hub::broadcast`], but waits for the control loop to report
    /// how many clients received the message and which were evicted.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::HubUnavailable`] if the control loop has stopped.
    pub async fn broadcast_confirmed(
        &self,
        message: HubMessage,
        scope: Scope,
    ) -> Result<Delivery, HubError> {
        let (reply, answer) = oneshot::channel();
        self.request(HubCommand::Broadcast {
            message: Arc::new(message),
            scope,
            reply: Some(reply),
        })
        .await?;
        answer.await.map_err(|_| HubError::HubUnavailable)
    }

    /// Returns a point-in-time snapshot of the registry.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::HubUnavailable`] if the control loop has stopped.
    pub async fn stats(&self) -> Result<HubStats, HubError> {
        let (reply, answer) = oneshot::channel();
        self.request(HubCommand::Stats(reply)).await?;
        answer.await.map_err(|_| HubError::HubUnavailable)
    }

    /// Disconnects every client and stops the control loop.
    pub async fn shutdown(&self) {
        self.submit(HubCommand::Shutdown).await;
    }

    async fn submit(&self, command: HubCommand) {
        if self.commands.send(command).await.is_err() {
            tracing::warn!("hub control loop is not running; command dropped");
        }
    }

    async fn request(&self, command: HubCommand) -> Result<(), HubError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| HubError::HubUnavailable)
    }
}

/// Owner of the registry. Runs until shut down or every [`Hub`] handle
/// is dropped.
#[derive(Debug)]
struct ControlLoop {
    registry: ClientRegistry,
    inbox: mpsc::Receiver<HubCommand>,
}

impl ControlLoop {
    async fn run(mut self) {
        tracing::debug!("hub control loop started");
        while let Some(command) = self.inbox.recv().await {
            if self.handle(command).is_break() {
                break;
            }
        }
        let remaining = self.registry.clear();
        tracing::info!(remaining, "hub control loop stopped");
    }

    fn handle(&mut self, command: HubCommand) -> ControlFlow<()> {
        match command {
            HubCommand::Register(handle) => self.register(handle),
            HubCommand::Unregister(id) => self.unregister(id),
            HubCommand::Broadcast {
                message,
                scope,
                reply,
            } => {
                let delivery = self.registry.deliver(&message, &scope);
                tracing::debug!(
                    event_type = %message.event_type,
                    scope = %scope,
                    delivered = delivery.delivered,
                    evicted = delivery.evicted.len(),
                    total = self.registry.len(),
                    "broadcast dispatched"
                );
                if let Some(reply) = reply {
                    let _ = reply.send(delivery);
                }
            }
            HubCommand::Stats(reply) => {
                let _ = reply.send(self.registry.stats());
            }
            HubCommand::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn register(&mut self, handle: ClientHandle) {
        let id = handle.id();
        let identity = handle.identity().clone();
        let welcome = Arc::new(HubMessage::new(
            EventType::CONNECTION_ESTABLISHED,
            serde_json::json!({
                "client_id": id,
                "user_id": identity.user_id,
                "role": identity.role,
            }),
        ));
        // A fresh queue always has room for the greeting.
        let _ = handle.try_push(welcome);

        if self.registry.insert(handle).is_some() {
            tracing::warn!(client_id = %id, "client id re-registered; previous entry closed");
        }
        tracing::info!(
            client_id = %id,
            user_id = identity.user_id,
            role = %identity.role,
            total = self.registry.len(),
            "client registered"
        );
    }

    fn unregister(&mut self, id: ClientId) {
        match self.registry.remove(&id) {
            Some(handle) => tracing::info!(
                client_id = %id,
                user_id = handle.identity().user_id,
                total = self.registry.len(),
                "client unregistered"
            ),
            None => tracing::trace!(client_id = %id, "unregister for unknown client ignored"),
        }
    }
}
