//! Per-connection handler: decode incoming frames, dispatch them to the
//! hub, and drain whatever events the hub (directly, or via a room actor)
//! queues back onto this connection's outbound channel.
//!
//! Each accepted connection gets its own Tokio task. The task races two
//! things with `tokio::select!`: the next inbound WebSocket frame, and the
//! next outbound event destined for this connection — a room broadcast can
//! arrive at any time, independent of anything this connection sent.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use xiangqi_protocol::{ClientCommand, Codec, JsonCodec, ServerEvent};
use xiangqi_transport::{Connection, WebSocketConnection};

use crate::hub::SessionHub;

/// Drop guard that releases a connection's username, room membership, and
/// outbound channel when the handler task exits, however it exits.
struct ConnectionGuard {
    connection_id: xiangqi_transport::ConnectionId,
    hub: Arc<Mutex<SessionHub>>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let connection_id = self.connection_id;
        let hub = Arc::clone(&self.hub);
        tokio::spawn(async move {
            hub.lock().await.unregister(connection_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(conn: WebSocketConnection, hub: Arc<Mutex<SessionHub>>) {
    let connection_id = conn.id();
    tracing::debug!(%connection_id, "connection accepted");

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ServerEvent>();
    hub.lock().await.register(connection_id, event_tx);
    let _guard = ConnectionGuard {
        connection_id,
        hub: Arc::clone(&hub),
    };

    let codec = JsonCodec;

    loop {
        tokio::select! {
            incoming = conn.recv() => {
                match incoming {
                    Ok(Some(data)) => {
                        handle_frame(&conn, &codec, &hub, connection_id, &data).await;
                    }
                    Ok(None) => {
                        tracing::debug!(%connection_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%connection_id, error = %e, "recv error");
                        break;
                    }
                }
            }
            event = event_rx.recv() => {
                match event {
                    Some(event) => {
                        if let Err(e) = send_event(&conn, &codec, &event).await {
                            tracing::debug!(%connection_id, error = %e, "send error");
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    // `_guard` drops here, scheduling cleanup.
}

/// Decoding happens in two steps so a syntactically valid message with an
/// unrecognized or malformed `action` is reported as `"Unknown action"`
/// rather than lumped in with actually malformed JSON.
async fn handle_frame(
    conn: &WebSocketConnection,
    codec: &JsonCodec,
    hub: &Arc<Mutex<SessionHub>>,
    connection_id: xiangqi_transport::ConnectionId,
    data: &[u8],
) {
    let value: serde_json::Value = match serde_json::from_slice(data) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(%connection_id, error = %e, "invalid JSON");
            let _ = send_event(
                conn,
                codec,
                &ServerEvent::Error {
                    message: "Invalid JSON".to_string(),
                },
            )
            .await;
            return;
        }
    };

    let command: ClientCommand = serde_json::from_value(value).unwrap_or(ClientCommand::Unknown);
    hub.lock().await.dispatch(connection_id, command).await;
}

async fn send_event(
    conn: &WebSocketConnection,
    codec: &JsonCodec,
    event: &ServerEvent,
) -> Result<(), crate::ServerError> {
    let bytes = codec.encode(event)?;
    conn.send(&bytes).await.map_err(crate::ServerError::from)
}
