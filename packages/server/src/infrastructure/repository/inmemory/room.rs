//! InMemory Room Repository implementation
//!
//! Holds the `Room` aggregate behind a mutex. Each trait method takes the lock
//! once, so every registry or log mutation is a single atomic step.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, ConnectionId, NewMessage, Participant, RegistryError, Room, RoomRepository,
    Timestamp, UserId, UserProfile,
};

pub struct InMemoryRoomRepository {
    room: Arc<Mutex<Room>>,
}

impl InMemoryRoomRepository {
    pub fn new(room: Arc<Mutex<Room>>) -> Self {
        Self { room }
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn register_participant(
        &self,
        connection_id: ConnectionId,
        profile: UserProfile,
        joined_at: Timestamp,
    ) -> Result<Participant, RegistryError> {
        let mut room = self.room.lock().await;
        room.participants.register(connection_id, profile, joined_at)
    }

    async fn unregister_participant(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Participant, RegistryError> {
        let mut room = self.room.lock().await;
        room.participants.unregister(connection_id)
    }

    async fn get_participant(&self, connection_id: &ConnectionId) -> Option<Participant> {
        let room = self.room.lock().await;
        room.participants.get(connection_id).cloned()
    }

    async fn list_participants(&self) -> Vec<Participant> {
        let room = self.room.lock().await;
        room.participants.list_all()
    }

    async fn participant_connection_ids(&self) -> Vec<ConnectionId> {
        let room = self.room.lock().await;
        room.participants.connection_ids()
    }

    async fn count_participants_for_user(&self, user_id: &UserId) -> usize {
        let room = self.room.lock().await;
        room.participants.count_for_user(user_id)
    }

    async fn post_message(&self, message: NewMessage) -> ChatMessage {
        let mut room = self.room.lock().await;
        room.post_message(message)
    }

    async fn message_snapshot(&self) -> Vec<ChatMessage> {
        let room = self.room.lock().await;
        room.messages.snapshot()
    }
}
