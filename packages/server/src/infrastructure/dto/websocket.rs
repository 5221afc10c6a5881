//! WebSocket event DTOs.
//!
//! Every frame is a JSON object `{"event": "<name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Inbound frame that could not be turned into a `ClientEvent`.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),

    #[error("unknown event '{0}'")]
    UnknownEvent(String),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// `join-chat` payload as sent by the client. Validation happens in the use case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "JoinChatWire")]
pub struct JoinChatPayload {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Web clients send the id as `_id`, others as `userId`, some send both.
#[derive(Deserialize)]
#[serde(expecting = "a join-chat payload object")]
struct JoinChatWire {
    #[serde(default, rename = "userId")]
    user_id: Option<String>,
    #[serde(default, rename = "_id")]
    underscore_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

impl From<JoinChatWire> for JoinChatPayload {
    fn from(wire: JoinChatWire) -> Self {
        let user_id = wire
            .user_id
            .filter(|id| !id.trim().is_empty())
            .or(wire.underscore_id);
        Self {
            user_id,
            name: wire.name,
            email: wire.email,
            role: wire.role,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessagePayload {
    #[serde(default)]
    pub text: String,
}

/// Client → server events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    JoinChat(JoinChatPayload),
    /// `join-chat` whose payload could not be decoded, with the decode error.
    MalformedJoin(String),
    SendMessage(SendMessagePayload),
    UserTyping,
    UserStopTyping,
    LeaveChat,
}

impl ClientEvent {
    /// Parse a text frame.
    ///
    /// A `join-chat` whose payload does not decode comes back as
    /// `MalformedJoin` so the join is rejected with the cause instead of
    /// being silently dropped.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(text)?;

        match envelope.event.as_str() {
            "join-chat" => Ok(match serde_json::from_value(envelope.data) {
                Ok(payload) => ClientEvent::JoinChat(payload),
                Err(e) => ClientEvent::MalformedJoin(e.to_string()),
            }),
            "send-message" => Ok(ClientEvent::SendMessage(serde_json::from_value(
                envelope.data,
            )?)),
            "user-typing" => Ok(ClientEvent::UserTyping),
            "user-stop-typing" => Ok(ClientEvent::UserStopTyping),
            "leave-chat" => Ok(ClientEvent::LeaveChat),
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }
}

/// Chat message as seen by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageDto {
    pub id: u64,
    pub text: String,
    /// Author display name.
    pub user: String,
    pub user_id: Option<String>,
    pub timestamp: String,
    pub socket_id: Option<String>,
}

/// Room participant as seen by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub socket_id: String,
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
    pub joined_at: String,
    pub is_online: bool,
    pub in_chatroom: bool,
}

/// Online user summary derived from the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUserDto {
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
    pub is_online: bool,
    pub last_seen: String,
    pub chatroom_joined: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUserDto {
    pub name: String,
    pub role: String,
}

/// Payload of `user-joined` / `user-left`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceNoticeDto {
    pub user: PresenceUserDto,
    pub timestamp: String,
}

/// Payload of `user-typing` / `user-stop-typing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingNoticeDto {
    pub user_name: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessageDto {
    pub message: String,
}

/// Server → client events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    Init(Vec<ChatMessageDto>),
    ActiveUsers(Vec<ParticipantDto>),
    OnlineUsersUpdate(Vec<OnlineUserDto>),
    NewMessage(ChatMessageDto),
    UserJoined(PresenceNoticeDto),
    UserLeft(PresenceNoticeDto),
    UserTyping(TypingNoticeDto),
    UserStopTyping(TypingNoticeDto),
    ErrorMessage(ErrorMessageDto),
}
