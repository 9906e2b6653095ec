//! Connection hub: registry ownership, scoped fan-out, and stats.
//!
//! All registry mutations go through one control loop ([`Hub`]), so the
//! map of live clients is never touched by two tasks at once. Delivery to
//! each client is a non-blocking push onto its bounded queue; a client
//! that cannot keep up is disconnected rather than buffered.

pub mod command;
pub mod control;
pub mod dispatch;
pub mod registry;

pub use command::HubCommand;
pub use control::Hub;
pub use registry::{ClientHandle, ClientQueue, ClientRegistry, Delivery};
