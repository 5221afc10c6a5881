//! Session Registry: which connections are currently attached to the room.

use std::collections::HashMap;

use super::{
    entity::{Participant, UserProfile},
    error::RegistryError,
    value_object::{ConnectionId, Timestamp, UserId},
};

/// Map from connection id to the participant bound to it.
///
/// At most one participant exists per connection. A user may own several
/// participants (one per tab or device).
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    participants: HashMap<ConnectionId, Participant>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a participant for `connection_id`.
    pub fn register(
        &mut self,
        connection_id: ConnectionId,
        profile: UserProfile,
        joined_at: Timestamp,
    ) -> Result<Participant, RegistryError> {
        if self.participants.contains_key(&connection_id) {
            return Err(RegistryError::DuplicateConnection(
                connection_id.into_string(),
            ));
        }

        let participant = Participant::new(connection_id.clone(), profile, joined_at);
        self.participants.insert(connection_id, participant.clone());
        Ok(participant)
    }

    /// Remove and return the participant bound to `connection_id`.
    pub fn unregister(&mut self, connection_id: &ConnectionId) -> Result<Participant, RegistryError> {
        self.participants
            .remove(connection_id)
            .ok_or_else(|| RegistryError::NotFound(connection_id.as_str().to_string()))
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<&Participant> {
        self.participants.get(connection_id)
    }

    /// Snapshot of every participant. Order is unspecified.
    pub fn list_all(&self) -> Vec<Participant> {
        self.participants.values().cloned().collect()
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.participants.keys().cloned().collect()
    }

    /// Number of participants owned by `user_id`.
    pub fn count_for_user(&self, user_id: &UserId) -> usize {
        self.participants
            .values()
            .filter(|p| p.user_id() == user_id)
            .count()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
