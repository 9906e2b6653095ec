//! WebSocket layer: transport, client pumps, lifecycle, and the upgrade
//! handler.
//!
//! The endpoint at `/ws` is broadcast-only: clients receive event frames
//! and answer pings, but application messages they send are ignored.

pub mod client;
pub mod connection;
pub mod handler;
pub mod lifecycle;
pub mod messages;

pub use client::Client;
pub use connection::{Connection, ConnectionError, WebSocketConnection};
pub use lifecycle::{ClientState, Lifecycle};
