//! # medpulse-notify
//!
//! Connection registry and event fan-out engine.
//!
//! - [`ClientConnection`]: one live WebSocket client, tagged with its owning
//!   user and role, reached through a bounded send queue
//! - [`NotificationHub`]: the registry, keeping by-user and by-role indexes
//!   over the live connection set, with delivery primitives that isolate and
//!   prune failed connections
//!
//! Delivery is fire-and-forget: events to offline recipients are dropped,
//! and per-connection failures never reach the producer.

#![deny(unsafe_code)]

pub mod connection;
pub mod hub;

pub use connection::ClientConnection;
pub use hub::NotificationHub;
