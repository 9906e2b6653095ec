//! Domain layer: identifiers, identities, messages, and stats.
//!
//! These types are shared by the hub, the WebSocket layer, and the REST
//! handlers. None of them own any concurrency primitives.

pub mod client_id;
pub mod identity;
pub mod message;
pub mod stats;

pub use client_id::ClientId;
pub use identity::{Identity, UserId};
pub use message::{EventType, HubMessage, Scope};
pub use stats::HubStats;
