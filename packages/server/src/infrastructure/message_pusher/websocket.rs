//! WebSocket MessagePusher implementation
//!
//! Connections are registered by the UI layer with the sending half of an
//! unbounded channel; the handler task drains the receiving half into the
//! socket. This type only serializes notices and feeds those channels.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel, RoomNotice},
    infrastructure::dto::websocket::ServerEvent,
};

/// MessagePusher backed by per-connection WebSocket outbound channels.
pub struct WebSocketMessagePusher {
    /// Key: connection id, Value: outbound channel
    clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(HashMap::new())))
    }
}

impl WebSocketMessagePusher {
    pub fn new(clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>) -> Self {
        Self { clients }
    }

    fn encode(notice: &RoomNotice) -> Result<String, MessagePushError> {
        serde_json::to_string(&ServerEvent::from(notice))
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!(connection_id = %connection_id, "Connection registered to MessagePusher");
        clients.insert(connection_id, sender);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        if clients.remove(connection_id).is_some() {
            tracing::debug!(connection_id = %connection_id, "Connection unregistered from MessagePusher");
        }
    }

    async fn is_registered(&self, connection_id: &ConnectionId) -> bool {
        self.clients.lock().await.contains_key(connection_id)
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        notice: &RoomNotice,
    ) -> Result<(), MessagePushError> {
        let content = Self::encode(notice)?;
        let clients = self.clients.lock().await;

        let sender = clients
            .get(connection_id)
            .ok_or_else(|| MessagePushError::ClientNotFound(connection_id.as_str().to_string()))?;
        sender
            .send(content)
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!(
            connection_id = %connection_id,
            event = notice.event_name(),
            "Pushed notice"
        );
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        notice: &RoomNotice,
    ) -> Result<(), MessagePushError> {
        let content = Self::encode(notice)?;
        let clients = self.clients.lock().await;

        for target in targets {
            match clients.get(&target) {
                // Partial failure is tolerated on broadcast
                Some(sender) => {
                    if let Err(e) = sender.send(content.clone()) {
                        tracing::warn!(connection_id = %target, "Failed to push {}: {}", notice.event_name(), e);
                    }
                }
                None => {
                    tracing::warn!(connection_id = %target, "Connection not found during broadcast, skipping");
                }
            }
        }

        tracing::debug!(event = notice.event_name(), "Broadcast complete");
        Ok(())
    }

    async fn broadcast_all(&self, notice: &RoomNotice) -> Result<(), MessagePushError> {
        let content = Self::encode(notice)?;
        let clients = self.clients.lock().await;

        for (connection_id, sender) in clients.iter() {
            if let Err(e) = sender.send(content.clone()) {
                tracing::warn!(connection_id = %connection_id, "Failed to push {}: {}", notice.event_name(), e);
            }
        }
        Ok(())
    }
}
