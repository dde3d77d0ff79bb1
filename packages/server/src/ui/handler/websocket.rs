//! WebSocket connection handlers.
//!
//! 接続ごとに ConnectionId を払い出し、受信したテキストフレームをそのまま
//! イベントループに渡す。送信は MessagePusher のチャンネル経由で行う。

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, ConnectionIdFactory},
    rpc::{EventSender, InboundEvent},
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// # Arguments
///
/// * `rx` - Channel receiver for responses and notifications addressed to this connection
/// * `sender` - WebSocket sink to send messages to this client
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    })
}

/// Forwards inbound frames to the event loop until the socket closes.
fn receiver_loop(
    mut receiver: futures_util::stream::SplitStream<WebSocket>,
    events: EventSender,
    connection_id: ConnectionId,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", connection_id, e);
                    break;
                }
            };

            let payload = match msg {
                Message::Text(text) => text.to_string(),
                Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => text,
                    Err(_) => {
                        tracing::warn!("Ignoring non-UTF-8 binary frame from '{}'", connection_id);
                        continue;
                    }
                },
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id);
                    break;
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                Message::Ping(_) | Message::Pong(_) => continue,
            };

            let event = InboundEvent::Call {
                connection_id: connection_id.clone(),
                payload,
            };
            if events.send(event).is_err() {
                tracing::error!("Event loop is gone; closing '{}'", connection_id);
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionIdFactory::generate();
    let (tx, rx) = mpsc::unbounded_channel();
    state
        .message_pusher
        .register_connection(connection_id.clone(), tx)
        .await;
    tracing::info!("Connection '{}' opened", connection_id);

    let (sender, receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);
    let mut recv_task = receiver_loop(receiver, state.events.clone(), connection_id.clone());

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    if state
        .events
        .send(InboundEvent::Disconnected {
            connection_id: connection_id.clone(),
        })
        .is_err()
    {
        tracing::warn!("Event loop is gone; disconnect of '{}' not recorded", connection_id);
    }
    tracing::info!("Connection '{}' closed", connection_id);
}
