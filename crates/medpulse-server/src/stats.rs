//! `/ws/stats` — live registry statistics.

use std::collections::HashMap;

use medpulse_core::UserId;
use medpulse_notify::NotificationHub;
use serde::Serialize;

/// Connection statistics, as served by `GET /ws/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct WsStats {
    /// Live connections across all users.
    pub total_connections: usize,
    /// Ids of users with at least one live connection.
    pub users_online: Vec<UserId>,
    /// Live connection count per recognized role.
    pub connections_by_role: HashMap<&'static str, usize>,
}

/// Snapshot the current registry state.
pub async fn collect(hub: &NotificationHub) -> WsStats {
    WsStats {
        total_connections: hub.connection_count(),
        users_online: hub.online_user_ids().await,
        connections_by_role: hub.role_counts().await,
    }
}
