//! Server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the MedPulse server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// HS256 secret used to verify handshake tokens.
    pub jwt_secret: String,
    /// Capacity of each connection's outbound queue.
    pub send_queue_capacity: usize,
    /// Interval between server-initiated Ping frames, in seconds.
    pub ping_interval_secs: u64,
    /// Close the connection after this long without a Pong, in seconds.
    pub pong_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            jwt_secret: "change-me".into(),
            send_queue_capacity: 256,
            ping_interval_secs: 30,
            pong_timeout_secs: 90,
        }
    }
}
