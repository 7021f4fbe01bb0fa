//! WebSocket session lifecycle — handles a single client from handshake
//! through disconnect.

use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use medpulse_core::Notification;
use medpulse_notify::connection;
use metrics::{counter, gauge, histogram};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::auth::{self, AuthError, Identity};
use crate::metrics::{
    WS_CLIENT_MESSAGES_TOTAL, WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_ACTIVE,
    WS_CONNECTIONS_TOTAL, WS_DISCONNECTIONS_TOTAL, WS_HANDSHAKES_REJECTED_TOTAL,
};
use crate::server::AppState;

/// Close code sent when the handshake credential is missing or invalid
/// (RFC 6455 policy violation).
const POLICY_VIOLATION: u16 = 1008;

/// Query parameters of the `/ws` endpoint.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Handshake credential issued at login.
    pub token: Option<String>,
}

/// GET `/ws?token=<jwt>` — upgrade and run a notification session.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, query.token, state))
}

async fn handle_socket(socket: WebSocket, token: Option<String>, state: AppState) {
    let identity = token
        .as_deref()
        .ok_or(AuthError::MissingToken)
        .and_then(|t| auth::decode_token(&state.config.jwt_secret, t));

    match identity {
        Ok(identity) => run_session(socket, identity, state).await,
        Err(err) => {
            // Refused before the registry ever sees the connection.
            warn!(error = %err, "websocket handshake rejected");
            counter!(WS_HANDSHAKES_REJECTED_TOTAL).increment(1);
            reject(socket, &err).await;
        }
    }
}

/// Close the socket with a policy-violation frame.
async fn reject(mut socket: WebSocket, err: &AuthError) {
    let reason = match err {
        AuthError::MissingToken => "missing token",
        AuthError::InvalidToken(_) | AuthError::MalformedSubject => "invalid token",
    };
    let frame = CloseFrame {
        code: POLICY_VIOLATION,
        reason: reason.into(),
    };
    let _ = socket.send(Message::Close(Some(frame))).await;
}

/// Run a notification session for an authenticated client.
///
/// 1. Registers the connection with the hub
/// 2. Sends a `connection_established` event
/// 3. Forwards hub traffic via the connection's send queue, with periodic
///    Ping frames to detect unresponsive clients
/// 4. Answers inbound text frames with an `echo` acknowledgement
/// 5. Unregisters and unwinds on disconnect, error, or server shutdown
#[instrument(skip_all, fields(user_id = identity.user_id, role = %identity.role_name))]
async fn run_session(socket: WebSocket, identity: Identity, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let connection_id = format!("conn_{}", Uuid::now_v7());
    let (connection, mut send_rx) = connection::channel(
        connection_id.clone(),
        identity.user_id,
        identity.role,
        state.config.send_queue_capacity,
    );

    info!(conn_id = %connection_id, "client connected");
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);

    state.hub.register(connection.clone()).await;

    // Welcome event, written directly; the queue is for fanout traffic.
    let welcome = Notification::new(
        "connection_established",
        "Connected",
        format!("connected as {}", identity.role_name),
        json!({
            "user_id": identity.user_id,
            "connection_id": connection_id,
        }),
    );
    match welcome.stamped().to_json() {
        Ok(json) => {
            let _ = ws_tx.send(Message::Text(json.into())).await;
        }
        Err(e) => warn!(error = %e, "failed to serialize welcome event"),
    }

    // Outbound forwarder: drains the send queue, pings periodically, and
    // drops the sink on shutdown or an unresponsive client.
    let ping_interval = Duration::from_secs(state.config.ping_interval_secs);
    let pong_timeout = Duration::from_secs(state.config.pong_timeout_secs);
    let outbound_conn = connection.clone();
    let outbound_cancel = state.shutdown.token();
    let outbound = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ping_interval);
        // Skip the immediate first tick
        let _ = ticker.tick().await;

        loop {
            tokio::select! {
                msg = send_rx.recv() => {
                    match msg {
                        Some(text) => {
                            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    if !outbound_conn.check_alive()
                        && outbound_conn.last_pong_elapsed() > pong_timeout
                    {
                        warn!("client unresponsive for {pong_timeout:?}, disconnecting");
                        break;
                    }
                    if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
                () = outbound_cancel.cancelled() => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    // Inbound loop: placeholder client→server surface, echoed back.
    let cancel = state.shutdown.token();
    loop {
        tokio::select! {
            maybe_msg = ws_rx.next() => {
                let Some(Ok(msg)) = maybe_msg else { break };
                match msg {
                    Message::Text(text) => {
                        counter!(WS_CLIENT_MESSAGES_TOTAL).increment(1);
                        let ack = Notification::new(
                            "echo",
                            "Message received",
                            format!("received: {}", text.as_str()),
                            json!({ "length": text.len() }),
                        );
                        match ack.stamped().to_json() {
                            Ok(json) => {
                                if !connection.send(json) {
                                    debug!("failed to enqueue echo (queue full or closed)");
                                }
                            }
                            Err(e) => warn!(error = %e, "failed to serialize echo"),
                        }
                    }
                    Message::Binary(data) => {
                        debug!(len = data.len(), "ignoring binary frame");
                    }
                    Message::Close(_) => {
                        info!("client sent close frame");
                        break;
                    }
                    Message::Ping(_) | Message::Pong(_) => connection.mark_alive(),
                }
            }
            () = cancel.cancelled() => {
                info!("server shutting down, closing session");
                break;
            }
        }
    }

    // Clean up: both indexes release the connection, no dangling tasks.
    info!("client disconnected");
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(connection.age().as_secs_f64());
    outbound.abort();
    state.hub.unregister(&connection).await;
}
