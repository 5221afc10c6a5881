//! Domain entities.

use super::value_object::{
    ConnectionId, DisplayName, MessageId, MessageText, PresenceRecord, Role, Timestamp, UserId,
};

/// Validated identity a client asserts when joining the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: UserId,
    pub name: DisplayName,
    pub email: Option<String>,
    pub role: Role,
}

/// One live connection attached to the chat room.
///
/// Owned by the Session Registry and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub connection_id: ConnectionId,
    pub profile: UserProfile,
    pub joined_at: Timestamp,
    pub in_chatroom: bool,
}

impl Participant {
    pub fn new(connection_id: ConnectionId, profile: UserProfile, joined_at: Timestamp) -> Self {
        Self {
            connection_id,
            profile,
            joined_at,
            in_chatroom: true,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.profile.user_id
    }

    pub fn name(&self) -> &DisplayName {
        &self.profile.name
    }
}

/// Where a chat message entered the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOrigin {
    /// Sent over a room connection.
    Connection(ConnectionId),
    /// Posted through the HTTP chat endpoint.
    Http,
}

impl MessageOrigin {
    pub fn connection_id(&self) -> Option<&ConnectionId> {
        match self {
            MessageOrigin::Connection(id) => Some(id),
            MessageOrigin::Http => None,
        }
    }
}

/// A message before the room assigns it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub text: MessageText,
    pub author_id: Option<UserId>,
    pub author_name: DisplayName,
    pub created_at: Timestamp,
    pub origin: MessageOrigin,
}

/// An immutable chat message retained by the Message Log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub text: MessageText,
    pub author_id: Option<UserId>,
    pub author_name: DisplayName,
    pub created_at: Timestamp,
    pub origin: MessageOrigin,
}

impl ChatMessage {
    pub fn from_new(id: MessageId, message: NewMessage) -> Self {
        Self {
            id,
            text: message.text,
            author_id: message.author_id,
            author_name: message.author_name,
            created_at: message.created_at,
            origin: message.origin,
        }
    }
}

/// A user as stored in the directory, with its presence flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub name: DisplayName,
    pub email: Option<String>,
    pub role: Role,
    pub presence: PresenceRecord,
}
