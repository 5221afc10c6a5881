//! Room repository trait.
//!
//! The use case layer depends on this trait, never on a concrete store.

use async_trait::async_trait;

use super::{
    entity::{ChatMessage, NewMessage, Participant, UserProfile},
    error::RegistryError,
    value_object::{ConnectionId, Timestamp, UserId},
};

/// Access to the process-local room state (Session Registry and Message Log).
///
/// Every method is one atomic step; no method holds state across an await
/// visible to callers.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn register_participant(
        &self,
        connection_id: ConnectionId,
        profile: UserProfile,
        joined_at: Timestamp,
    ) -> Result<Participant, RegistryError>;

    async fn unregister_participant(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Participant, RegistryError>;

    async fn get_participant(&self, connection_id: &ConnectionId) -> Option<Participant>;

    async fn list_participants(&self) -> Vec<Participant>;

    async fn participant_connection_ids(&self) -> Vec<ConnectionId>;

    async fn count_participants_for_user(&self, user_id: &UserId) -> usize;

    /// Store a message at the tail of the log and return it with its id.
    async fn post_message(&self, message: NewMessage) -> ChatMessage;

    async fn message_snapshot(&self) -> Vec<ChatMessage>;
}
