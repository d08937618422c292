//! WebSocket connection handlers.
//!
//! 1 接続あたり 3 つのタスクで動く。
//!
//! - 受信タスク: フレームを読み、生存確認の応答はその場で解決し、それ以外を処理タスクへ渡す
//! - 処理タスク: `EventDispatcher` がイベントを受信順に 1 つずつ処理する
//! - 送信タスク: `OutboundFrame` を WebSocket に書き出す
//!
//! 生存確認の応答を処理タスクと分けているため、入室処理の待ち中でも応答が詰まらない。

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    domain::{ConnectionId, OutboundFrame},
    infrastructure::dto::websocket::{ACK_EVENT, ClientFrame},
    ui::state::AppState,
};

use super::event::EventDispatcher;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives frames from the rx channel and pushes them to the WebSocket sender.
///
/// `OutboundFrame::Close` closes the socket from the server side (zombie eviction).
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<OutboundFrame>,
    mut sender: SplitSink<WebSocket, Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match frame {
                OutboundFrame::Text(text) => {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                OutboundFrame::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    })
}

/// Spawns a task that reads frames from this client.
///
/// 生存確認への ack は直接 pusher に渡し、それ以外は `frames` へ流す。
fn reader_loop(
    mut receiver: SplitStream<WebSocket>,
    state: Arc<AppState>,
    connection_id: ConnectionId,
    frames: mpsc::UnboundedSender<ClientFrame>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let frame = match serde_json::from_str::<ClientFrame>(&text) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::warn!(
                                "Dropping malformed frame from '{}': {}",
                                connection_id,
                                e
                            );
                            continue;
                        }
                    };

                    if frame.event == ACK_EVENT {
                        settle_probe(&state, &connection_id, frame).await;
                        continue;
                    }

                    if frames.send(frame).is_err() {
                        break;
                    }
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    })
}

async fn settle_probe(state: &AppState, connection_id: &ConnectionId, frame: ClientFrame) {
    let Some(ack_id) = frame.ack_id else {
        tracing::debug!("Ack without ackId from '{}'", connection_id);
        return;
    };
    let reply = frame.data.as_str().unwrap_or_default().to_string();
    if !state.message_pusher.settle_probe(&ack_id, reply).await {
        tracing::debug!("Late or unknown ack '{}' from '{}'", ack_id, connection_id);
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, receiver) = socket.split();

    // Create a channel for this client to receive frames
    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = state
        .connect_participant_usecase
        .execute(tx.clone())
        .await;

    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<ClientFrame>();
    let mut dispatcher = EventDispatcher::new(state.clone(), connection_id.clone(), tx);
    let dispatch_task = tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            dispatcher.dispatch(frame).await;
        }
    });

    let mut recv_task = reader_loop(receiver, state.clone(), connection_id.clone(), frame_tx);
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // 受信済みのイベントを処理し終えてから後片付けする
    // （途中の入室が切断処理の後に完了すると、在室者一覧に残ってしまうため）
    if let Err(e) = dispatch_task.await {
        tracing::error!("Dispatcher for '{}' stopped abnormally: {}", connection_id, e);
    }

    state
        .disconnect_participant_usecase
        .execute(&connection_id)
        .await;
}
