//! The connection registry and fan-out engine.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use medpulse_core::{Notification, Role, UserId};
use metrics::counter;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::connection::ClientConnection;

/// Registry of live client connections, indexed by owning user and by role.
///
/// Both indexes are views onto the same connection set and sit behind a
/// single lock, so they can never diverge: a connection is added to both in
/// `register` and removed from both in `unregister` or when a delivery to it
/// fails.
///
/// Fan-out snapshots the target set under the read lock, sends without
/// holding any lock, and prunes failed connections under the write lock
/// afterwards. Each delivery attempt stamps the event with its own
/// timestamp, so recipients of one logical event may observe slightly
/// different timestamps.
pub struct NotificationHub {
    inner: RwLock<Indexes>,
    /// Lock-free live-connection count for observability endpoints.
    active_count: AtomicUsize,
}

#[derive(Default)]
struct Indexes {
    by_user: HashMap<UserId, Vec<Arc<ClientConnection>>>,
    by_role: HashMap<Role, Vec<Arc<ClientConnection>>>,
}

/// Remove a connection from both indexes by id.
///
/// Returns `true` if the connection was present in the by-user index,
/// the signal that the live count must be decremented. A by-user entry
/// left empty is deleted outright.
fn remove_connection(inner: &mut Indexes, user_id: UserId, role: Option<Role>, id: &str) -> bool {
    let mut removed = false;
    if let Some(conns) = inner.by_user.get_mut(&user_id) {
        let before = conns.len();
        conns.retain(|c| c.id != id);
        removed = conns.len() < before;
        if conns.is_empty() {
            let _ = inner.by_user.remove(&user_id);
        }
    }
    if let Some(role) = role {
        if let Some(conns) = inner.by_role.get_mut(&role) {
            conns.retain(|c| c.id != id);
        }
    }
    removed
}

impl NotificationHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Indexes::default()),
            active_count: AtomicUsize::new(0),
        }
    }

    /// Add a connection to the registry.
    ///
    /// The connection enters the by-user index under its owner's id and,
    /// when its role was recognized, the by-role index. Pure insertion;
    /// an unrecognized role never blocks registration.
    pub async fn register(&self, connection: Arc<ClientConnection>) {
        let mut inner = self.inner.write().await;
        inner
            .by_user
            .entry(connection.user_id)
            .or_default()
            .push(connection.clone());
        if let Some(role) = connection.role {
            inner.by_role.entry(role).or_default().push(connection);
        }
        let _ = self.active_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Remove a connection from both indexes.
    ///
    /// Idempotent: the disconnect path and failed-send cleanup may race,
    /// and the loser is a no-op.
    pub async fn unregister(&self, connection: &ClientConnection) {
        let mut inner = self.inner.write().await;
        if remove_connection(&mut inner, connection.user_id, connection.role, &connection.id) {
            let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Deliver an event to every connection held by `user_id`.
    ///
    /// An unknown or offline user is a silent no-op. Failures are isolated
    /// per connection and never reach the caller.
    pub async fn send_to_user(&self, user_id: UserId, event: &Notification) {
        let targets = {
            let inner = self.inner.read().await;
            inner.by_user.get(&user_id).cloned().unwrap_or_default()
        };
        self.deliver(targets, event, "user").await;
    }

    /// Deliver an event to every connection whose owner holds `role`.
    pub async fn send_to_role(&self, role: Role, event: &Notification) {
        let targets = {
            let inner = self.inner.read().await;
            inner.by_role.get(&role).cloned().unwrap_or_default()
        };
        self.deliver(targets, event, role.as_str()).await;
    }

    /// Deliver an event to every live connection.
    pub async fn broadcast(&self, event: &Notification) {
        let targets: Vec<Arc<ClientConnection>> = {
            let inner = self.inner.read().await;
            inner.by_user.values().flatten().cloned().collect()
        };
        self.deliver(targets, event, "all").await;
    }

    /// Stamp, serialize, and enqueue the event per connection; prune any
    /// connection whose send failed.
    async fn deliver(&self, targets: Vec<Arc<ClientConnection>>, event: &Notification, label: &str) {
        if targets.is_empty() {
            return;
        }
        let mut failed = Vec::new();
        let mut delivered = 0u32;
        for conn in targets {
            // One timestamp per delivery attempt, so the payload is built
            // per connection rather than shared.
            let json = match event.stamped().to_json() {
                Ok(json) => json,
                Err(e) => {
                    warn!(kind = %event.kind, error = %e, "failed to serialize event");
                    return;
                }
            };
            if conn.send(json) {
                delivered += 1;
            } else {
                counter!("notify_drops_total").increment(1);
                warn!(
                    conn_id = %conn.id,
                    user_id = conn.user_id,
                    label,
                    "failed to enqueue event (queue full or closed)"
                );
                failed.push(conn);
            }
        }
        debug!(kind = %event.kind, label, delivered, "fanout complete");
        if !failed.is_empty() {
            self.prune(&failed).await;
        }
    }

    /// Drop dead connections from both indexes.
    async fn prune(&self, dead: &[Arc<ClientConnection>]) {
        let mut inner = self.inner.write().await;
        for conn in dead {
            if remove_connection(&mut inner, conn.user_id, conn.role, &conn.id) {
                let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
                counter!("notify_pruned_total").increment(1);
                debug!(conn_id = %conn.id, user_id = conn.user_id, "pruned dead connection");
            }
        }
    }

    /// Number of live connections (sum over all users).
    pub fn connection_count(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }

    /// Ids of users with at least one live connection, sorted.
    pub async fn online_user_ids(&self) -> Vec<UserId> {
        let inner = self.inner.read().await;
        let mut ids: Vec<UserId> = inner.by_user.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Live connection count per recognized role.
    ///
    /// Every recognized role is present in the output, at zero when idle;
    /// unrecognized roles are never role-indexed and never appear.
    pub async fn role_counts(&self) -> HashMap<&'static str, usize> {
        let inner = self.inner.read().await;
        Role::ALL
            .iter()
            .map(|role| {
                let count = inner.by_role.get(role).map_or(0, Vec::len);
                (role.as_str(), count)
            })
            .collect()
    }

    /// Empty both indexes and return every connection that was live.
    ///
    /// Used by the shutdown path to close all remaining connections.
    pub async fn drain(&self) -> Vec<Arc<ClientConnection>> {
        let mut inner = self.inner.write().await;
        let drained: Vec<Arc<ClientConnection>> =
            inner.by_user.drain().flat_map(|(_, conns)| conns).collect();
        inner.by_role.clear();
        self.active_count.store(0, Ordering::Relaxed);
        drained
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}
