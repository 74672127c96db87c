//! WebSocket handlers for real-time updates
//!
//! Streams activity entries to connected clients as orchestration runs.
//! Clients may pass `?session_id=` to receive a single session's feed.
//! Supports ping/pong for connection keepalive.

use crate::api::utils::SessionQuery;
use crate::session::ActivityEvent;
use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::{error, info, warn};

/// WebSocket message types for real-time communication
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum WebSocketMessage {
    /// New activity entry
    #[serde(rename = "activity")]
    Activity {
        /// Session the entry belongs to
        session_id: String,
        /// Who did it
        actor: String,
        /// What happened
        action: String,
        /// pending, processing, completed or failed
        status: String,
        /// RFC 3339 timestamp
        timestamp: String,
    },
    /// Ping message for connection keepalive
    #[serde(rename = "ping")]
    Ping,
    /// Pong message responding to ping
    #[serde(rename = "pong")]
    Pong,
}

impl From<ActivityEvent> for WebSocketMessage {
    fn from(event: ActivityEvent) -> Self {
        let status = serde_json::to_value(event.entry.status)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        WebSocketMessage::Activity {
            session_id: event.session_id,
            actor: event.entry.actor,
            action: event.entry.action,
            status,
            timestamp: event.entry.timestamp.to_rfc3339(),
        }
    }
}

/// WebSocket upgrade handler
///
/// Sends the current activity of the requested session (if any), then
/// forwards new entries until the client disconnects.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query.session_id))
}

// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState, session_filter: Option<String>) {
    let (mut sender, mut receiver) = socket.split();

    info!(session = ?session_filter, "WebSocket client connected");

    // Subscribe before the snapshot so nothing falls between the two
    let feed = BroadcastStream::new(state.sessions.subscribe());

    let initial_state = match &session_filter {
        Some(session_id) => {
            let session = state.sessions.get_or_create(session_id).await;
            serde_json::json!({
                "type": "initial_state",
                "session_id": session_id,
                "is_processing": session.is_processing(),
                "activities": session.activity().recent(),
            })
        }
        None => serde_json::json!({
            "type": "initial_state",
            "activities": [],
        }),
    };

    if let Err(e) = sender.send(Message::Text(initial_state.to_string())).await {
        error!("Failed to send initial state: {}", e);
        return;
    }

    // Use a channel to send messages from the other tasks to the sender
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Message>();

    // Task to forward messages from channel to sender
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = sender.send(msg).await {
                error!("Failed to send message: {}", e);
                break;
            }
        }
    });

    // Task to forward activity entries
    let feed_tx = tx.clone();
    let mut feed_task = tokio::spawn(async move {
        let mut feed = feed;
        while let Some(item) = feed.next().await {
            let event = match item {
                Ok(event) => event,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(skipped, "WebSocket client lagged behind activity feed");
                    continue;
                }
            };
            if session_filter
                .as_deref()
                .map_or(false, |id| id != event.session_id)
            {
                continue;
            }
            let Ok(text) = serde_json::to_string(&WebSocketMessage::from(event)) else {
                continue;
            };
            if feed_tx.send(Message::Text(text)).is_err() {
                break;
            }
        }
    });

    // Task to send periodic pings
    let ping_tx = tx.clone();
    let mut ping_task = tokio::spawn(async move {
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(30)).await;
            if ping_tx.send(Message::Ping(vec![])).is_err() {
                break;
            }
        }
    });

    // Receive messages
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Ok(WebSocketMessage::Ping) = serde_json::from_str::<WebSocketMessage>(&text) {
                        if let Ok(pong_msg) = serde_json::to_string(&WebSocketMessage::Pong) {
                            if tx.send(Message::Text(pong_msg)).is_err() {
                                break;
                            }
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    info!("WebSocket client disconnected");
                    break;
                }
                Ok(Message::Pong(_)) => {
                    // Client responded to ping
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for any task to complete
    tokio::select! {
        _ = &mut send_task => {}
        _ = &mut feed_task => {}
        _ = &mut ping_task => {}
        _ = &mut recv_task => {}
    }
    send_task.abort();
    feed_task.abort();
    ping_task.abort();
    recv_task.abort();

    info!("WebSocket connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ActivityEntry, ActivityStatus};
    use chrono::Utc;

    #[test]
    fn test_activity_message_shape() {
        let event = ActivityEvent {
            session_id: "s1".to_string(),
            entry: ActivityEntry {
                actor: "Master Orchestrator".to_string(),
                action: "Analyzing request...".to_string(),
                status: ActivityStatus::Processing,
                timestamp: Utc::now(),
            },
        };
        let value = serde_json::to_value(WebSocketMessage::from(event)).unwrap();
        assert_eq!(value["type"], "activity");
        assert_eq!(value["status"], "processing");
        assert_eq!(value["session_id"], "s1");
    }

    #[test]
    fn test_ping_round_trip() {
        let msg: WebSocketMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(msg, WebSocketMessage::Ping));
    }
}
