//! Conversion from domain entities and notices to DTOs.

use clubroom_shared::time::timestamp_to_rfc3339;

use crate::domain::{
    ChatMessage, Participant, RoomNotice, TypingState, UserRecord,
    value_object::{DisplayName, Role, Timestamp},
};
use crate::infrastructure::dto::websocket::{
    ChatMessageDto, ErrorMessageDto, OnlineUserDto, ParticipantDto, PresenceNoticeDto,
    PresenceUserDto, ServerEvent, TypingNoticeDto,
};

impl From<&ChatMessage> for ChatMessageDto {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: message.id.value(),
            text: message.text.as_str().to_string(),
            user: message.author_name.as_str().to_string(),
            user_id: message.author_id.as_ref().map(|id| id.as_str().to_string()),
            timestamp: timestamp_to_rfc3339(message.created_at.value()),
            socket_id: message
                .origin
                .connection_id()
                .map(|id| id.as_str().to_string()),
        }
    }
}

impl From<&Participant> for ParticipantDto {
    fn from(participant: &Participant) -> Self {
        Self {
            socket_id: participant.connection_id.as_str().to_string(),
            user_id: participant.user_id().as_str().to_string(),
            name: participant.name().as_str().to_string(),
            email: participant.profile.email.clone(),
            role: participant.profile.role.to_string(),
            joined_at: timestamp_to_rfc3339(participant.joined_at.value()),
            is_online: true,
            in_chatroom: participant.in_chatroom,
        }
    }
}

impl From<&UserRecord> for OnlineUserDto {
    fn from(record: &UserRecord) -> Self {
        Self {
            user_id: record.id.as_str().to_string(),
            name: record.name.as_str().to_string(),
            email: record.email.clone(),
            role: record.role.to_string(),
            is_online: record.presence.is_online,
            last_seen: timestamp_to_rfc3339(record.presence.last_seen.value()),
            chatroom_joined: record.presence.chatroom_joined,
        }
    }
}

fn presence_notice(name: &DisplayName, role: Role, at: Timestamp) -> PresenceNoticeDto {
    PresenceNoticeDto {
        user: PresenceUserDto {
            name: name.as_str().to_string(),
            role: role.to_string(),
        },
        timestamp: timestamp_to_rfc3339(at.value()),
    }
}

impl From<&RoomNotice> for ServerEvent {
    fn from(notice: &RoomNotice) -> Self {
        match notice {
            RoomNotice::History(messages) => {
                ServerEvent::Init(messages.iter().map(ChatMessageDto::from).collect())
            }
            RoomNotice::ActiveUsers(participants) => ServerEvent::ActiveUsers(
                participants.iter().map(ParticipantDto::from).collect(),
            ),
            RoomNotice::OnlineUsers(users) => {
                ServerEvent::OnlineUsersUpdate(users.iter().map(OnlineUserDto::from).collect())
            }
            RoomNotice::NewMessage(message) => ServerEvent::NewMessage(message.into()),
            RoomNotice::UserJoined { name, role, at } => {
                ServerEvent::UserJoined(presence_notice(name, *role, *at))
            }
            RoomNotice::UserLeft { name, role, at } => {
                ServerEvent::UserLeft(presence_notice(name, *role, *at))
            }
            RoomNotice::Typing {
                state,
                user_name,
                at,
            } => {
                let dto = TypingNoticeDto {
                    user_name: user_name.as_str().to_string(),
                    timestamp: timestamp_to_rfc3339(at.value()),
                };
                match state {
                    TypingState::Started => ServerEvent::UserTyping(dto),
                    TypingState::Stopped => ServerEvent::UserStopTyping(dto),
                }
            }
            RoomNotice::Error { message } => ServerEvent::ErrorMessage(ErrorMessageDto {
                message: message.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ConnectionId, MessageId, MessageOrigin, MessageText, PresenceRecord, UserId,
        UserProfile,
    };

    fn alice_profile() -> UserProfile {
        UserProfile {
            user_id: UserId::new("u1".to_string()).unwrap(),
            name: DisplayName::new("Alice".to_string()).unwrap(),
            email: Some("alice@club.org".to_string()),
            role: Role::OfficeBearer,
        }
    }

    #[test]
    fn test_chat_message_from_connection_to_dto() {
        // given (preconditions):
        let message = ChatMessage {
            id: MessageId::new(7),
            text: MessageText::new("hi".to_string()).unwrap(),
            author_id: Some(UserId::new("u1".to_string()).unwrap()),
            author_name: DisplayName::new("Alice".to_string()).unwrap(),
            created_at: Timestamp::new(1_672_531_200_000),
            origin: MessageOrigin::Connection(ConnectionId::new("c1".to_string()).unwrap()),
        };

        // when (operation):
        let dto = ChatMessageDto::from(&message);

        // then (expected):
        assert_eq!(dto.id, 7);
        assert_eq!(dto.text, "hi");
        assert_eq!(dto.user, "Alice");
        assert_eq!(dto.user_id.as_deref(), Some("u1"));
        assert_eq!(dto.socket_id.as_deref(), Some("c1"));
        assert_eq!(dto.timestamp, "2023-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_http_message_has_no_socket_or_user_id() {
        let message = ChatMessage {
            id: MessageId::new(1),
            text: MessageText::new("from the web".to_string()).unwrap(),
            author_id: None,
            author_name: DisplayName::anonymous(),
            created_at: Timestamp::new(0),
            origin: MessageOrigin::Http,
        };

        let json = serde_json::to_value(ChatMessageDto::from(&message)).unwrap();

        assert_eq!(json["user"], "Anonymous");
        assert!(json["userId"].is_null());
        assert!(json["socketId"].is_null());
    }

    #[test]
    fn test_participant_to_dto_uses_camel_case() {
        // given (preconditions):
        let participant = Participant::new(
            ConnectionId::new("c1".to_string()).unwrap(),
            alice_profile(),
            Timestamp::new(0),
        );

        // when (operation):
        let json = serde_json::to_value(ParticipantDto::from(&participant)).unwrap();

        // then (expected):
        assert_eq!(json["socketId"], "c1");
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["role"], "officebearer");
        assert_eq!(json["inChatroom"], true);
        assert_eq!(json["isOnline"], true);
    }

    #[test]
    fn test_user_joined_notice_to_event() {
        // given (preconditions):
        let notice = RoomNotice::UserJoined {
            name: DisplayName::new("Bob".to_string()).unwrap(),
            role: Role::Member,
            at: Timestamp::new(0),
        };

        // when (operation):
        let json = serde_json::to_value(ServerEvent::from(&notice)).unwrap();

        // then (expected):
        assert_eq!(json["event"], "user-joined");
        assert_eq!(json["data"]["user"]["name"], "Bob");
        assert_eq!(json["data"]["user"]["role"], "member");
        assert_eq!(json["data"]["timestamp"], "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_online_users_notice_to_event() {
        let record = UserRecord {
            id: UserId::new("u1".to_string()).unwrap(),
            name: DisplayName::new("Alice".to_string()).unwrap(),
            email: None,
            role: Role::Admin,
            presence: PresenceRecord {
                is_online: true,
                last_seen: Timestamp::new(0),
                chatroom_joined: false,
            },
        };

        let json =
            serde_json::to_value(ServerEvent::from(&RoomNotice::OnlineUsers(vec![record])))
                .unwrap();

        assert_eq!(json["event"], "online-users-update");
        assert_eq!(json["data"][0]["userId"], "u1");
        assert_eq!(json["data"][0]["chatroomJoined"], false);
        assert_eq!(json["data"][0]["role"], "admin");
    }
}
