// src/http/ws.rs

//! WebSocket push channel for live recovery output.
//!
//! Each connection owns one broadcast subscription and only sees events
//! published after it connected. Inbound frames other than close are ignored.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{Sink, SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::oneshot;

use crate::broadcast::{LogEvent, LogSubscription};

use super::state::AppState;

/// `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe before the upgrade completes so nothing published after the
    // handshake is missed.
    let subscription = state.supervisor.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, subscription))
}

/// Wire format of one event.
pub fn encode_event(event: &LogEvent) -> String {
    match event {
        LogEvent::Line { text, .. } => json!({
            "event": "log_update",
            "data": text,
        }),
        LogEvent::Complete { success, .. } => json!({
            "event": "recovery_complete",
            "success": success,
        }),
    }
    .to_string()
}

async fn handle_socket(socket: WebSocket, subscription: LogSubscription) {
    tracing::info!("log observer connected");

    let (sink, mut stream) = socket.split();
    let (stop_tx, stop_rx) = oneshot::channel();
    let send_task = tokio::spawn(forward_events(subscription, sink, stop_rx));

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "observer receive error");
                break;
            }
        }
    }

    let _ = stop_tx.send(());
    match send_task.await {
        Ok(skipped) if skipped > 0 => {
            tracing::info!(skipped, "log observer disconnected after dropping events");
        }
        Ok(_) => tracing::info!("log observer disconnected"),
        Err(e) => tracing::warn!(error = %e, "log observer sender task failed"),
    }
}

/// Push events into `sink` until the subscription closes, the sink fails or
/// `stop` fires. Returns how many events the subscription lost to lag.
async fn forward_events<S>(
    mut subscription: LogSubscription,
    mut sink: S,
    mut stop: oneshot::Receiver<()>,
) -> u64
where
    S: Sink<Message> + Unpin,
{
    loop {
        tokio::select! {
            _ = &mut stop => break,
            event = subscription.recv() => {
                let Some(event) = event else { break };
                let frame = Message::Text(encode_event(&event).into());
                if sink.send(frame).await.is_err() {
                    tracing::debug!("observer sink closed");
                    break;
                }
            }
        }
    }
    subscription.skipped()
}
