//! WebSocket stream of change events.
//!
//! Displays connect to `/ws/events` and refetch `/api/data` when they see
//! `draft:published`. By default a client receives every event; sending
//! `{"subscribe": "logs:*"}` narrows the stream and `{"unsubscribe": ...}`
//! widens it again.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::state::SharedState;

/// Control message from a client.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(untagged)]
enum ClientMessage {
    Subscribe { subscribe: String },
    Unsubscribe { unsubscribe: String },
}

/// Event forwarded to a client.
#[derive(Serialize)]
struct WsEvent {
    event_type: String,
    payload: serde_json::Value,
}

type Subscriptions = Arc<Mutex<HashSet<String>>>;

/// Handler for GET /ws/events
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<SharedState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<SharedState>) {
    let (mut sender, mut receiver) = socket.split();
    let subscriptions: Subscriptions = Arc::new(Mutex::new(HashSet::new()));
    let mut event_rx = state.context.event_bus.subscribe();

    let recv_subs = Arc::clone(&subscriptions);
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            let Message::Text(text) = msg else {
                continue;
            };
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Subscribe { subscribe }) => {
                    log::debug!("WebSocket subscribed to {}", subscribe);
                    lock(&recv_subs).insert(subscribe);
                }
                Ok(ClientMessage::Unsubscribe { unsubscribe }) => {
                    log::debug!("WebSocket unsubscribed from {}", unsubscribe);
                    lock(&recv_subs).remove(&unsubscribe);
                }
                Err(_) => log::debug!("Ignoring unrecognized WebSocket message"),
            }
        }
    });

    let send_task = tokio::spawn(async move {
        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(count)) => {
                    log::warn!("WebSocket client lagged by {} events", count);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let wanted = {
                let subs = lock(&subscriptions);
                subs.is_empty()
                    || subs
                        .iter()
                        .any(|pattern| matches_pattern(&event.event_type, pattern))
            };
            if !wanted {
                continue;
            }

            let ws_event = WsEvent {
                event_type: event.event_type,
                payload: event.payload,
            };
            let Ok(json) = serde_json::to_string(&ws_event) else {
                continue;
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    join_first(recv_task, send_task).await;
    log::debug!("WebSocket connection closed");
}

/// Wait for either task to finish and abort the other, releasing its bus
/// receiver or socket half.
async fn join_first(mut a: JoinHandle<()>, mut b: JoinHandle<()>) {
    tokio::select! {
        _ = &mut a => b.abort(),
        _ = &mut b => a.abort(),
    }
}

fn lock(subs: &Subscriptions) -> std::sync::MutexGuard<'_, HashSet<String>> {
    subs.lock().unwrap_or_else(|e| e.into_inner())
}

/// Check if an event type matches a subscription pattern.
///
/// `*` stands for one `:`-separated segment; a trailing `:*` matches any
/// suffix.
fn matches_pattern(event_type: &str, pattern: &str) -> bool {
    if event_type == pattern {
        return true;
    }

    if let Some(prefix) = pattern.strip_suffix(":*") {
        if event_type
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with(':'))
        {
            return true;
        }
    }

    if !pattern.contains('*') {
        return false;
    }

    let pattern_parts: Vec<&str> = pattern.split(':').collect();
    let event_parts: Vec<&str> = event_type.split(':').collect();
    pattern_parts.len() == event_parts.len()
        && pattern_parts
            .iter()
            .zip(&event_parts)
            .all(|(p, e)| *p == "*" || p == e)
}

// ============================================================================
// TESTS
// ============================================================================
