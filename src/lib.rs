//! # realtime-hub
//!
//! WebSocket connection hub with identity-scoped event fan-out.
//!
//! Clients authenticate during the upgrade handshake, are registered with
//! a single hub control loop, and receive server-generated events
//! addressed to everyone, to one user's connections, or to one role.
//! Slow consumers are disconnected instead of buffered, and silent peers
//! are detected with ping/pong heartbeats.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket)         Admin / producers (HTTP)
//!     │                           │
//!     ├── WS Handler (ws/)        ├── REST Handlers (api/)
//!     │     │                     │
//!     │   Client: outbound pump   │
//!     │           inbound pump    │
//!     │     │                     │
//!     └─────┴──── Hub control loop (hub/) ───┘
//!                    │
//!              ClientRegistry (single owner)
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod hub;
pub mod server;
pub mod ws;
