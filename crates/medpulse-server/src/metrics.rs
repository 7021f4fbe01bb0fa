//! Prometheus metrics recorder and `/metrics` endpoint handler.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Must be called once at server startup before any metrics are recorded.
pub fn install_recorder() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

// Metric name constants to avoid typos across modules.

/// WebSocket connections opened total (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// WebSocket disconnections total (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Active WebSocket connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// Connection lifetime in seconds (histogram).
pub const WS_CONNECTION_DURATION_SECONDS: &str = "ws_connection_duration_seconds";
/// Handshakes refused for bad credentials (counter).
pub const WS_HANDSHAKES_REJECTED_TOTAL: &str = "ws_handshakes_rejected_total";
/// Inbound client text frames (counter).
pub const WS_CLIENT_MESSAGES_TOTAL: &str = "ws_client_messages_total";
/// Deliveries dropped on a full or closed queue (counter).
pub const NOTIFY_DROPS_TOTAL: &str = "notify_drops_total";
/// Connections pruned after a failed delivery (counter).
pub const NOTIFY_PRUNED_TOTAL: &str = "notify_pruned_total";
