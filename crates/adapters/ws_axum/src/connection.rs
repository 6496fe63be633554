//! Websocket connection lifecycle.
//!
//! Each connection gets a fresh [`ConnectionId`] and a bounded push
//! channel, registers with the subscription manager, and then a single
//! task serves both directions: inbound command frames and outbound
//! state-change pushes. Whatever ends the loop, the connection is
//! unregistered before the task finishes.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;

use dashview_app::ports::{AreaRegistry, DeviceRegistry, EntityRegistry, EntityWatcher};
use dashview_domain::id::ConnectionId;

use crate::protocol::{ErrorFrame, Request, event_frame};
use crate::state::AppState;

/// Per-connection push buffer. A client that cannot drain this many
/// pending events is considered dead.
const PUSH_BUFFER: usize = 64;

/// `GET /ws` upgrade handler.
pub async fn ws_handler<H, W>(
    State(state): State<AppState<H, W>>,
    ws: WebSocketUpgrade,
) -> Response
where
    H: EntityRegistry + DeviceRegistry + AreaRegistry + Send + Sync + 'static,
    W: EntityWatcher + Send + Sync + 'static,
{
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket<H, W>(state: AppState<H, W>, socket: WebSocket)
where
    H: EntityRegistry + DeviceRegistry + AreaRegistry + Send + Sync + 'static,
    W: EntityWatcher + Send + Sync + 'static,
{
    let conn = ConnectionId::new();
    let (push_tx, mut push_rx) = mpsc::channel(PUSH_BUFFER);
    state.manager.register_connection(conn, push_tx).await;
    tracing::info!(connection = %conn, "websocket connected");

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let reply = handle_frame(&state, conn, text.as_str()).await;
                    if send_json(&mut sink, &reply).await.is_err() {
                        break;
                    }
                }
                // Control frames are handled by axum; binary is not part
                // of the protocol.
                Some(Ok(Message::Binary(_) | Message::Ping(_) | Message::Pong(_))) => {}
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
            },
            event = push_rx.recv() => match event {
                Some(event) => {
                    if send_json(&mut sink, &event_frame(&event)).await.is_err() {
                        break;
                    }
                }
                // Channel closed means the manager dropped us.
                None => break,
            },
        }
    }

    state.manager.unregister_connection(conn).await;
    tracing::info!(connection = %conn, "websocket disconnected");
}

async fn handle_frame<H, W>(
    state: &AppState<H, W>,
    conn: ConnectionId,
    text: &str,
) -> serde_json::Value
where
    H: EntityRegistry + DeviceRegistry + AreaRegistry + Send + Sync + 'static,
    W: EntityWatcher + Send + Sync + 'static,
{
    match serde_json::from_str::<Request>(text) {
        Ok(request) => crate::commands::dispatch(state, conn, request).await,
        Err(err) => {
            tracing::warn!(connection = %conn, error = %err, "unparseable frame");
            ErrorFrame::new(None, "invalid_format", err.to_string()).into()
        }
    }
}

async fn send_json<S>(sink: &mut S, value: &serde_json::Value) -> Result<(), S::Error>
where
    S: Sink<Message> + Unpin,
{
    sink.send(Message::Text(value.to_string().into())).await
}
