//! WebSocket client connection state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use medpulse_core::{Role, UserId};
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// A live WebSocket client, tagged with its owner's identity and role.
///
/// Outbound traffic goes through a bounded queue drained by the connection's
/// single writer task: fanout never blocks on a slow socket, and writes to
/// one connection are serialized in enqueue order.
pub struct ClientConnection {
    /// Unique connection id (one user may hold several, one per device/tab).
    pub id: String,
    /// Owning user.
    pub user_id: UserId,
    /// Owner's role, if it was recognized at registration time.
    pub role: Option<Role>,
    /// Send channel to the connection's writer task.
    tx: mpsc::Sender<String>,
    /// When this connection was established.
    pub connected_at: Instant,
    /// Whether the client has responded since the last ping.
    pub is_alive: AtomicBool,
    /// When the last Pong (or any liveness signal) was received.
    last_pong: Mutex<Instant>,
    /// Count of messages dropped due to a full or closed queue.
    dropped_messages: AtomicU64,
}

impl ClientConnection {
    /// Create a new connection.
    pub fn new(id: String, user_id: UserId, role: Option<Role>, tx: mpsc::Sender<String>) -> Self {
        let now = Instant::now();
        Self {
            id,
            user_id,
            role,
            tx,
            connected_at: now,
            is_alive: AtomicBool::new(true),
            last_pong: Mutex::new(now),
            dropped_messages: AtomicU64::new(0),
        }
    }

    /// Enqueue a text frame for the writer task.
    ///
    /// Never blocks. Returns `false` if the queue is full (slow client) or
    /// closed (dead client), and increments the dropped message counter.
    pub fn send(&self, message: String) -> bool {
        if self.tx.try_send(message).is_ok() {
            true
        } else {
            let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Serialize a JSON value and enqueue it.
    pub fn send_json(&self, value: &serde_json::Value) -> bool {
        match serde_json::to_string(value) {
            Ok(json) => self.send(json),
            Err(_) => false,
        }
    }

    /// Total messages dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Mark the connection as alive (pong received).
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
        *self.last_pong.lock() = Instant::now();
    }

    /// Duration since the last pong (or connection establishment).
    pub fn last_pong_elapsed(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }

    /// Check and reset the alive flag for the ping cycle.
    ///
    /// Returns `true` if the connection was alive since the last check.
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

/// Build a connection plus the receiving end of its send queue.
///
/// The session loop owns the receiver; everything else holds the connection
/// behind an [`Arc`].
pub fn channel(
    id: String,
    user_id: UserId,
    role: Option<Role>,
    capacity: usize,
) -> (Arc<ClientConnection>, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(capacity);
    (Arc::new(ClientConnection::new(id, user_id, role, tx)), rx)
}
