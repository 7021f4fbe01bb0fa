//! WebSocket endpoint — handshake, session lifecycle, echo surface.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `session` | Token handshake, upgrade, per-connection read/write loops |
//!
//! ## Data Flow
//!
//! `session` authenticates the handshake, registers the connection with the
//! [`medpulse_notify::NotificationHub`], forwards hub traffic to the socket,
//! and answers inbound frames with echo acknowledgements.

pub mod session;
