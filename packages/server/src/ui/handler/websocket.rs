//! WebSocket connection handler.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::{sync::mpsc, time::MissedTickBehavior};

use crate::{
    config::Liveness,
    domain::{ConnectionId, TypingState},
    infrastructure::dto::websocket::{ClientEvent, JoinChatPayload},
    ui::state::AppState,
    usecase::{JoinRequest, RoomEvent},
};

/// How long the outbound side may keep flushing after the inbound side ends.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

impl From<JoinChatPayload> for JoinRequest {
    fn from(payload: JoinChatPayload) -> Self {
        Self {
            user_id: payload.user_id,
            name: payload.name,
            email: payload.email,
            role: payload.role,
        }
    }
}

impl From<ClientEvent> for RoomEvent {
    fn from(event: ClientEvent) -> Self {
        match event {
            ClientEvent::JoinChat(payload) => RoomEvent::Join(payload.into()),
            ClientEvent::MalformedJoin(reason) => RoomEvent::MalformedJoin { reason },
            ClientEvent::SendMessage(payload) => RoomEvent::SendMessage { text: payload.text },
            ClientEvent::UserTyping => RoomEvent::Typing(TypingState::Started),
            ClientEvent::UserStopTyping => RoomEvent::Typing(TypingState::Stopped),
            ClientEvent::LeaveChat => RoomEvent::Leave,
        }
    }
}

/// Drains the connection's outbound channel into the socket and sends a ping
/// every `ping_interval`.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
    liveness: Liveness,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ping = tokio::time::interval(liveness.ping_interval);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ping.tick().await;

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else { break };
                    if sender.send(Message::Text(msg.into())).await.is_err() {
                        break;
                    }
                }
                _ = ping.tick() => {
                    if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionId::generate();
    let (tx, rx) = mpsc::unbounded_channel();
    state.coordinator.connect(connection_id.clone(), tx).await;

    let (sender, mut receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender, state.liveness);

    let events = state.events.clone();
    let ping_timeout = state.liveness.ping_timeout;
    let recv_connection_id = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        let mut channel_failed = false;
        loop {
            // Any inbound frame, pongs included, proves the peer is alive.
            let msg = match tokio::time::timeout(ping_timeout, receiver.next()).await {
                Ok(Some(Ok(msg))) => {
                    channel_failed = false;
                    msg
                }
                // A read error ends the stream on the next poll; the end of
                // stream is what triggers cleanup.
                Ok(Some(Err(e))) => {
                    if channel_failed {
                        break;
                    }
                    channel_failed = true;
                    tracing::warn!(connection_id = %recv_connection_id, "WebSocket error: {}", e);
                    events.submit(
                        recv_connection_id.clone(),
                        RoomEvent::ChannelError {
                            reason: e.to_string(),
                        },
                    );
                    continue;
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::info!(connection_id = %recv_connection_id, "No frames within {:?}; closing", ping_timeout);
                    break;
                }
            };

            match msg {
                Message::Text(text) => match ClientEvent::parse(text.as_str()) {
                    Ok(event) => {
                        tracing::debug!(connection_id = %recv_connection_id, ?event, "Received event");
                        if !events.submit(recv_connection_id.clone(), event.into()) {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(connection_id = %recv_connection_id, "Dropping frame: {}", e);
                    }
                },
                Message::Close(_) => {
                    tracing::debug!(connection_id = %recv_connection_id, "Client requested close");
                    break;
                }
                Message::Binary(_) => {
                    tracing::warn!(connection_id = %recv_connection_id, "Dropping binary frame");
                }
                // Pings are answered automatically; pongs only refresh the timeout.
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    });

    tokio::select! {
        _ = &mut recv_task => {
            // Disconnect unregisters the outbound channel, so the send task
            // flushes whatever is still queued and then stops on its own.
            state.events.submit(connection_id.clone(), RoomEvent::Disconnect);
            if tokio::time::timeout(FLUSH_TIMEOUT, &mut send_task).await.is_err() {
                tracing::debug!(connection_id = %connection_id, "Outbound flush timed out");
                send_task.abort();
            }
        }
        _ = &mut send_task => {
            recv_task.abort();
            state.events.submit(connection_id, RoomEvent::Disconnect);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_events_map_to_room_events() {
        // given (preconditions):
        let join = ClientEvent::parse(
            r#"{"event":"join-chat","data":{"_id":"u1","name":"Alice","role":"admin"}}"#,
        )
        .unwrap();

        // when (operation):
        let event = RoomEvent::from(join);

        // then (expected):
        assert_eq!(
            event,
            RoomEvent::Join(JoinRequest {
                user_id: Some("u1".to_string()),
                name: Some("Alice".to_string()),
                email: None,
                role: Some("admin".to_string()),
            })
        );
        assert_eq!(
            RoomEvent::from(ClientEvent::UserStopTyping),
            RoomEvent::Typing(TypingState::Stopped)
        );
        assert_eq!(RoomEvent::from(ClientEvent::LeaveChat), RoomEvent::Leave);
    }

    #[test]
    fn test_undecodable_join_keeps_its_cause() {
        let join = ClientEvent::parse(r#"{"event":"join-chat","data":"Alice"}"#).unwrap();

        let RoomEvent::MalformedJoin { reason } = RoomEvent::from(join) else {
            panic!("expected a malformed join");
        };
        assert!(reason.contains("expected a join-chat payload object"), "{}", reason);
    }
}
