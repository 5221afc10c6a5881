//! Outbound notifications produced by the room, independent of wire format.

use super::{
    entity::{ChatMessage, Participant, UserRecord},
    value_object::{DisplayName, Role, Timestamp},
};

/// Typing indicator direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingState {
    Started,
    Stopped,
}

/// Something the room tells one or more connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomNotice {
    /// Message history for a new joiner.
    History(Vec<ChatMessage>),
    /// Current room membership.
    ActiveUsers(Vec<Participant>),
    /// Every user the directory reports as online.
    OnlineUsers(Vec<UserRecord>),
    NewMessage(ChatMessage),
    UserJoined {
        name: DisplayName,
        role: Role,
        at: Timestamp,
    },
    UserLeft {
        name: DisplayName,
        role: Role,
        at: Timestamp,
    },
    Typing {
        state: TypingState,
        user_name: DisplayName,
        at: Timestamp,
    },
    Error {
        message: String,
    },
}

impl RoomNotice {
    /// Event name used on the wire, for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            RoomNotice::History(_) => "init",
            RoomNotice::ActiveUsers(_) => "active-users",
            RoomNotice::OnlineUsers(_) => "online-users-update",
            RoomNotice::NewMessage(_) => "new-message",
            RoomNotice::UserJoined { .. } => "user-joined",
            RoomNotice::UserLeft { .. } => "user-left",
            RoomNotice::Typing {
                state: TypingState::Started,
                ..
            } => "user-typing",
            RoomNotice::Typing {
                state: TypingState::Stopped,
                ..
            } => "user-stop-typing",
            RoomNotice::Error { .. } => "error-message",
        }
    }
}
