//! Presence Broadcaster: join/leave notices and membership snapshots.
//!
//! Two snapshots are kept apart on purpose: `active-users` (room membership)
//! only ever reaches room members or the joiner, while `online-users-update`
//! (directory presence) reaches every connection.
//!
//! All operations are fire-and-forget. Delivery failures are logged and never
//! returned to the caller.

use std::sync::Arc;

use crate::domain::{
    ConnectionId, MessagePusher, Participant, RoomNotice, RoomRepository, Timestamp, TypingState,
};

use super::directory_adapter::DirectoryAdapter;

/// Audience of a room snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotTarget {
    /// One connection (typically the joiner).
    Connection(ConnectionId),
    /// Every room member.
    Room,
    /// Every room member except one.
    RoomExcept(ConnectionId),
}

pub struct PresenceBroadcaster {
    repository: Arc<dyn RoomRepository>,
    pusher: Arc<dyn MessagePusher>,
    directory: Arc<DirectoryAdapter>,
}

impl PresenceBroadcaster {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        pusher: Arc<dyn MessagePusher>,
        directory: Arc<DirectoryAdapter>,
    ) -> Self {
        Self {
            repository,
            pusher,
            directory,
        }
    }

    /// Tell every other room member that `participant` joined.
    pub async fn announce_join(&self, participant: &Participant, at: Timestamp) {
        let notice = RoomNotice::UserJoined {
            name: participant.name().clone(),
            role: participant.profile.role,
            at,
        };
        let targets = self.room_targets_except(&participant.connection_id).await;
        self.deliver(targets, &notice).await;
    }

    /// Tell the remaining room members that `participant` left.
    ///
    /// Expects the participant to be unregistered already.
    pub async fn announce_leave(&self, participant: &Participant, at: Timestamp) {
        let notice = RoomNotice::UserLeft {
            name: participant.name().clone(),
            role: participant.profile.role,
            at,
        };
        let targets = self.room_targets_except(&participant.connection_id).await;
        self.deliver(targets, &notice).await;
    }

    /// Send the current participant list, sorted by display name then join time.
    pub async fn push_room_snapshot(&self, target: SnapshotTarget) {
        let notice = RoomNotice::ActiveUsers(self.sorted_participants().await);

        match target {
            SnapshotTarget::Connection(connection_id) => {
                if let Err(e) = self.pusher.push_to(&connection_id, &notice).await {
                    tracing::warn!(connection_id = %connection_id, "Failed to push room snapshot: {}", e);
                }
            }
            SnapshotTarget::Room => {
                let targets = self.repository.participant_connection_ids().await;
                self.deliver(targets, &notice).await;
            }
            SnapshotTarget::RoomExcept(excluded) => {
                let targets = self.room_targets_except(&excluded).await;
                self.deliver(targets, &notice).await;
            }
        }
    }

    /// Broadcast the directory's online users to every connection.
    ///
    /// Skipped when the directory read fails, so clients keep their last view.
    pub async fn push_online_snapshot(&self) {
        let users = match self.directory.list_online().await {
            Ok(users) => users,
            Err(_) => {
                tracing::warn!("Skipping online-users-update after directory failure");
                return;
            }
        };

        if let Err(e) = self
            .pusher
            .broadcast_all(&RoomNotice::OnlineUsers(users))
            .await
        {
            tracing::warn!("Failed to broadcast online users: {}", e);
        }
    }

    /// Relay a typing indicator to the rest of the room.
    pub async fn relay_typing(&self, participant: &Participant, state: TypingState, at: Timestamp) {
        let notice = RoomNotice::Typing {
            state,
            user_name: participant.name().clone(),
            at,
        };
        let targets = self.room_targets_except(&participant.connection_id).await;
        self.deliver(targets, &notice).await;
    }

    pub async fn sorted_participants(&self) -> Vec<Participant> {
        let mut participants = self.repository.list_participants().await;
        participants.sort_by(|a, b| {
            a.name()
                .cmp(b.name())
                .then_with(|| a.joined_at.cmp(&b.joined_at))
                .then_with(|| a.connection_id.cmp(&b.connection_id))
        });
        participants
    }

    async fn room_targets_except(&self, excluded: &ConnectionId) -> Vec<ConnectionId> {
        self.repository
            .participant_connection_ids()
            .await
            .into_iter()
            .filter(|id| id != excluded)
            .collect()
    }

    async fn deliver(&self, targets: Vec<ConnectionId>, notice: &RoomNotice) {
        if targets.is_empty() {
            return;
        }
        if let Err(e) = self.pusher.broadcast(targets, notice).await {
            tracing::warn!("Failed to broadcast {}: {}", notice.event_name(), e);
        }
    }
}
