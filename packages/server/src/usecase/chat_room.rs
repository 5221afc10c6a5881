//! Chat Room Coordinator
//!
//! Drives the per-connection state machine:
//!
//! ```text
//! Connected --join--> Joined --leave--> Connected
//!     \                  |
//!      `--disconnect-----`--disconnect--> Closed
//! ```
//!
//! Every handler absorbs its own persistence and delivery failures, so nothing
//! propagates out of [`ChatRoomCoordinator::handle`].

use std::sync::Arc;

use clubroom_shared::time::Clock;

use crate::domain::{
    ChatMessage, ConnectionId, DirectoryError, DisplayName, MessageOrigin, MessagePusher,
    MessageText, NewMessage, Participant, PusherChannel, RegistryError, Role, RoomNotice,
    RoomRepository, Timestamp, TypingState, UserId, UserProfile, UserRecord, ValueObjectError,
};

use super::{
    directory_adapter::DirectoryAdapter,
    error::{JoinError, PostMessageError},
    presence_broadcaster::{PresenceBroadcaster, SnapshotTarget},
};

/// Notice sent to a connection after a transport error.
pub const CONNECTION_ERROR_MESSAGE: &str = "Connection error occurred";

/// Identity asserted by a client in `join-chat`, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinRequest {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl TryFrom<JoinRequest> for UserProfile {
    type Error = ValueObjectError;

    fn try_from(request: JoinRequest) -> Result<Self, Self::Error> {
        let user_id = UserId::new(request.user_id.unwrap_or_default())?;
        let name = DisplayName::new(request.name.unwrap_or_default())?;
        let role = match request.role.as_deref().map(str::trim) {
            None | Some("") => Role::default(),
            Some(role) => role.parse()?,
        };
        let email = request
            .email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty());

        Ok(UserProfile {
            user_id,
            name,
            email,
            role,
        })
    }
}

/// Inbound event for one connection, as decoded by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    Join(JoinRequest),
    /// A `join-chat` frame whose payload could not be decoded.
    MalformedJoin { reason: String },
    SendMessage { text: String },
    Typing(TypingState),
    Leave,
    Disconnect,
    ChannelError { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Channel open, not a room member.
    Connected,
    /// Registered participant.
    Joined,
    /// Channel gone.
    Closed,
}

pub struct ChatRoomCoordinator {
    repository: Arc<dyn RoomRepository>,
    pusher: Arc<dyn MessagePusher>,
    directory: Arc<DirectoryAdapter>,
    broadcaster: PresenceBroadcaster,
    clock: Arc<dyn Clock>,
    require_known_user: bool,
}

impl ChatRoomCoordinator {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        pusher: Arc<dyn MessagePusher>,
        directory: Arc<DirectoryAdapter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let broadcaster =
            PresenceBroadcaster::new(repository.clone(), pusher.clone(), directory.clone());
        Self {
            repository,
            pusher,
            directory,
            broadcaster,
            clock,
            require_known_user: false,
        }
    }

    /// Reject joins from users the directory does not know.
    pub fn require_known_user(mut self, require: bool) -> Self {
        self.require_known_user = require;
        self
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// Attach a freshly opened channel. The connection starts in `Connected`.
    pub async fn connect(&self, connection_id: ConnectionId, sender: PusherChannel) {
        tracing::info!(connection_id = %connection_id, "Connection opened");
        self.pusher.register_client(connection_id, sender).await;
    }

    /// Dispatch one inbound event.
    pub async fn handle(&self, connection_id: &ConnectionId, event: RoomEvent) {
        match event {
            RoomEvent::Join(request) => {
                if let Err(e) = self.join(connection_id, request).await {
                    self.report_join_error(connection_id, e).await;
                }
            }
            RoomEvent::MalformedJoin { reason } => {
                self.report_join_error(connection_id, JoinError::InvalidJoinPayload(reason))
                    .await;
            }
            RoomEvent::SendMessage { text } => {
                self.send_message(connection_id, text).await;
            }
            RoomEvent::Typing(state) => self.relay_typing(connection_id, state).await,
            RoomEvent::Leave => {
                self.leave(connection_id).await;
            }
            RoomEvent::Disconnect => {
                self.disconnect(connection_id).await;
            }
            RoomEvent::ChannelError { reason } => self.channel_error(connection_id, &reason).await,
        }
    }

    async fn report_join_error(&self, connection_id: &ConnectionId, error: JoinError) {
        match &error {
            JoinError::DuplicateConnection(_) => {
                tracing::warn!(connection_id = %connection_id, "Ignoring join: {}", error);
            }
            JoinError::InvalidJoinPayload(_) | JoinError::UnknownUser(_) => {
                tracing::info!(connection_id = %connection_id, "Join rejected: {}", error);
                let notice = RoomNotice::Error {
                    message: error.to_string(),
                };
                if let Err(e) = self.pusher.push_to(connection_id, &notice).await {
                    tracing::warn!(connection_id = %connection_id, "Failed to report join error: {}", e);
                }
            }
        }
    }

    /// `Connected -> Joined`.
    pub async fn join(
        &self,
        connection_id: &ConnectionId,
        request: JoinRequest,
    ) -> Result<Participant, JoinError> {
        let profile = UserProfile::try_from(request)
            .map_err(|e| JoinError::InvalidJoinPayload(e.to_string()))?;

        if self.repository.get_participant(connection_id).await.is_some() {
            return Err(JoinError::DuplicateConnection(connection_id.to_string()));
        }

        let profile = self.reconcile_with_directory(profile).await?;
        let joined_at = self.now();
        let participant = self
            .repository
            .register_participant(connection_id.clone(), profile, joined_at)
            .await
            .map_err(|e| match e {
                RegistryError::DuplicateConnection(id) | RegistryError::NotFound(id) => {
                    JoinError::DuplicateConnection(id)
                }
            })?;

        tracing::info!(
            connection_id = %connection_id,
            user_id = %participant.user_id(),
            role = %participant.profile.role,
            "Participant joined the chat room"
        );

        // Failure is logged by the adapter; the join goes ahead regardless.
        let _ = self
            .directory
            .set_presence(participant.user_id(), true, true)
            .await;

        let history = RoomNotice::History(self.repository.message_snapshot().await);
        if let Err(e) = self.pusher.push_to(connection_id, &history).await {
            tracing::warn!(connection_id = %connection_id, "Failed to send history: {}", e);
        }
        self.broadcaster
            .push_room_snapshot(SnapshotTarget::Connection(connection_id.clone()))
            .await;
        self.broadcaster.announce_join(&participant, joined_at).await;
        self.broadcaster
            .push_room_snapshot(SnapshotTarget::RoomExcept(connection_id.clone()))
            .await;
        self.broadcaster.push_online_snapshot().await;

        Ok(participant)
    }

    /// Prefer the directory's name and role over what the client asserted.
    async fn reconcile_with_directory(&self, profile: UserProfile) -> Result<UserProfile, JoinError> {
        match self.directory.find_user(&profile.user_id).await {
            Ok(Some(record)) => Ok(UserProfile {
                user_id: record.id,
                name: record.name,
                email: record.email.or(profile.email),
                role: record.role,
            }),
            Ok(None) if self.require_known_user => {
                Err(JoinError::UnknownUser(profile.user_id.into_string()))
            }
            Ok(None) => Ok(profile),
            Err(_) => Ok(profile),
        }
    }

    /// Append a message from a joined connection and broadcast it to the room,
    /// sender included.
    ///
    /// Returns `None` when nothing was appended.
    pub async fn send_message(&self, connection_id: &ConnectionId, text: String) -> Option<ChatMessage> {
        let Some(participant) = self.repository.get_participant(connection_id).await else {
            tracing::debug!(connection_id = %connection_id, "Ignoring send-message from a connection that has not joined");
            return None;
        };

        let text = match MessageText::new(text) {
            Ok(text) => text,
            Err(e) => {
                let message = match e {
                    ValueObjectError::TooLong { max, .. } => {
                        format!("Message text must be at most {} characters.", max)
                    }
                    _ => PostMessageError::TextRequired.to_string(),
                };
                if let Err(e) = self
                    .pusher
                    .push_to(connection_id, &RoomNotice::Error { message })
                    .await
                {
                    tracing::warn!(connection_id = %connection_id, "Failed to report invalid message: {}", e);
                }
                return None;
            }
        };

        let message = self
            .repository
            .post_message(NewMessage {
                text,
                author_id: Some(participant.user_id().clone()),
                author_name: participant.name().clone(),
                created_at: self.now(),
                origin: MessageOrigin::Connection(connection_id.clone()),
            })
            .await;
        tracing::info!(
            connection_id = %connection_id,
            message_id = message.id.value(),
            "Message appended"
        );

        self.broadcast_to_room(&RoomNotice::NewMessage(message.clone()))
            .await;
        Some(message)
    }

    pub async fn relay_typing(&self, connection_id: &ConnectionId, state: TypingState) {
        let Some(participant) = self.repository.get_participant(connection_id).await else {
            tracing::debug!(connection_id = %connection_id, "Ignoring typing notice from a connection that has not joined");
            return;
        };
        self.broadcaster
            .relay_typing(&participant, state, self.now())
            .await;
    }

    /// `Joined -> Connected`.
    pub async fn leave(&self, connection_id: &ConnectionId) -> Option<Participant> {
        self.depart(connection_id).await
    }

    /// `(any) -> Closed`. Idempotent with [`Self::leave`].
    pub async fn disconnect(&self, connection_id: &ConnectionId) -> Option<Participant> {
        self.pusher.unregister_client(connection_id).await;
        let departed = self.depart(connection_id).await;
        tracing::info!(connection_id = %connection_id, "Connection closed");
        departed
    }

    async fn depart(&self, connection_id: &ConnectionId) -> Option<Participant> {
        let participant = match self.repository.unregister_participant(connection_id).await {
            Ok(participant) => participant,
            Err(_) => {
                tracing::debug!(connection_id = %connection_id, "No participant to remove");
                return None;
            }
        };
        tracing::info!(
            connection_id = %connection_id,
            user_id = %participant.user_id(),
            "Participant left the chat room"
        );

        // Another tab of the same user keeps it online.
        let remaining = self
            .repository
            .count_participants_for_user(participant.user_id())
            .await;
        if remaining == 0 {
            let _ = self
                .directory
                .set_presence(participant.user_id(), false, false)
                .await;
        } else {
            tracing::debug!(
                user_id = %participant.user_id(),
                remaining,
                "User still joined from another connection; presence kept"
            );
        }

        self.broadcaster
            .announce_leave(&participant, self.now())
            .await;
        self.broadcaster
            .push_room_snapshot(SnapshotTarget::Room)
            .await;
        self.broadcaster.push_online_snapshot().await;

        Some(participant)
    }

    /// Notify the connection of a transport error. State is unchanged.
    pub async fn channel_error(&self, connection_id: &ConnectionId, reason: &str) {
        tracing::warn!(connection_id = %connection_id, "Channel error: {}", reason);
        let notice = RoomNotice::Error {
            message: CONNECTION_ERROR_MESSAGE.to_string(),
        };
        if let Err(e) = self.pusher.push_to(connection_id, &notice).await {
            tracing::debug!(connection_id = %connection_id, "Could not deliver error notice: {}", e);
        }
    }

    pub async fn connection_state(&self, connection_id: &ConnectionId) -> ConnectionState {
        if self.repository.get_participant(connection_id).await.is_some() {
            ConnectionState::Joined
        } else if self.pusher.is_registered(connection_id).await {
            ConnectionState::Connected
        } else {
            ConnectionState::Closed
        }
    }

    /// Append a message posted over HTTP and broadcast it to the room.
    ///
    /// A blank or missing author posts as `Anonymous`.
    pub async fn post_http_message(
        &self,
        author: Option<String>,
        text: Option<String>,
    ) -> Result<ChatMessage, PostMessageError> {
        let text = MessageText::new(text.unwrap_or_default()).map_err(|e| match e {
            ValueObjectError::Empty(_) => PostMessageError::TextRequired,
            other => PostMessageError::Invalid(other),
        })?;
        let author_name = match author.filter(|author| !author.trim().is_empty()) {
            Some(author) => DisplayName::new(author).map_err(PostMessageError::Invalid)?,
            None => DisplayName::anonymous(),
        };

        let message = self
            .repository
            .post_message(NewMessage {
                text,
                author_id: None,
                author_name,
                created_at: self.now(),
                origin: MessageOrigin::Http,
            })
            .await;
        tracing::info!(message_id = message.id.value(), "Message posted over HTTP");

        self.broadcast_to_room(&RoomNotice::NewMessage(message.clone()))
            .await;
        Ok(message)
    }

    /// Current room members, sorted by display name then join time.
    pub async fn participants(&self) -> Vec<Participant> {
        self.broadcaster.sorted_participants().await
    }

    /// Retained messages, oldest first.
    pub async fn history(&self) -> Vec<ChatMessage> {
        self.repository.message_snapshot().await
    }

    pub async fn online_users(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        self.directory.list_online().await
    }

    async fn broadcast_to_room(&self, notice: &RoomNotice) {
        let targets = self.repository.participant_connection_ids().await;
        if targets.is_empty() {
            return;
        }
        if let Err(e) = self.pusher.broadcast(targets, notice).await {
            tracing::warn!("Failed to broadcast {}: {}", notice.event_name(), e);
        }
    }
}
