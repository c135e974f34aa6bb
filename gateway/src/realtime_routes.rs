//! Live battlefield WebSocket
//!
//! One connection = one registered subscriber channel + one feed loop task.
//! Frames are JSON text, one `FeedMessage` each.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use tracing::{debug, info, warn};

use crate::realtime::subscriber_channel;
use crate::sim_state::AppState;

pub async fn battlefield_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let (tx, mut rx) = subscriber_channel();
    let id = state.subscribers.register(tx.clone());
    info!("Subscriber {} connected ({} live)", id, state.subscribers.len());

    let feed = state.feed.clone();
    let rng = state.rng.next_rng();
    let feed_task = tokio::spawn(async move { feed.stream(id, tx, rng).await });

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                let Some(message) = outbound else { break };
                let json = match serde_json::to_string(&*message) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Dropping unserializable feed message for {}: {}", id, e);
                        continue;
                    }
                };
                if socket.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("Subscriber {} socket error: {}", id, e);
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    feed_task.abort();
    state.subscribers.deregister(id);
    info!("Subscriber {} disconnected ({} live)", id, state.subscribers.len());
}
