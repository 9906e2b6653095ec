//! Requests accepted by the hub control loop.

use std::sync::Arc;

use tokio::sync::oneshot;

use super::registry::{ClientHandle, Delivery};
use crate::domain::{ClientId, HubMessage, HubStats, Scope};

/// One unit of work for the control loop.
///
/// Every registry read or write arrives as a `HubCommand`, so the loop
/// handles them strictly one after another.
#[derive(Debug)]
pub enum HubCommand {
    /// Add (or replace) a client.
    Register(ClientHandle),
    /// Remove a client if present.
    Unregister(ClientId),
    /// Fan a message out to the clients selected by `scope`.
    Broadcast {
        /// Message shared by every target queue.
        message: Arc<HubMessage>,
        /// Target selector.
        scope: Scope,
        /// Optional channel receiving the delivery outcome.
        reply: Option<oneshot::Sender<Delivery>>,
    },
    /// Take a registry snapshot.
    Stats(oneshot::Sender<HubStats>),
    /// Drop every client and stop the loop.
    Shutdown,
}
