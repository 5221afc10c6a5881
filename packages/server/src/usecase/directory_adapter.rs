//! Directory Adapter: bounded, logged access to the user directory.
//!
//! Failures are returned for callers that care (HTTP handlers) but are always
//! logged here, so the realtime flow can ignore them.

use std::{future::Future, sync::Arc, time::Duration};

use clubroom_shared::time::Clock;

use crate::domain::{DirectoryError, PresenceRecord, Timestamp, UserDirectory, UserId, UserRecord};

/// Default upper bound for a single directory call.
pub const DEFAULT_DIRECTORY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct DirectoryAdapter {
    directory: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl DirectoryAdapter {
    pub fn new(directory: Arc<dyn UserDirectory>, clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        Self {
            directory,
            clock,
            timeout,
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, DirectoryError>>,
    ) -> Result<T, DirectoryError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DirectoryError::Timeout(self.timeout.as_millis() as u64)),
        }
    }

    /// Persist presence flags for `user_id`, stamping `last_seen` with the current time.
    pub async fn set_presence(
        &self,
        user_id: &UserId,
        online: bool,
        in_chatroom: bool,
    ) -> Result<(), DirectoryError> {
        let presence = PresenceRecord {
            is_online: online,
            last_seen: Timestamp::new(self.clock.now_millis()),
            chatroom_joined: in_chatroom,
        };

        let result = self
            .bounded(self.directory.update_presence(user_id, presence))
            .await;
        match &result {
            Ok(()) => tracing::debug!(user_id = %user_id, online, in_chatroom, "Presence updated"),
            Err(e) => tracing::error!(user_id = %user_id, "Failed to update presence: {}", e),
        }
        result
    }

    /// Point-in-time read of every user flagged online.
    pub async fn list_online(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        let result = self.bounded(self.directory.list_where_online()).await;
        if let Err(e) = &result {
            tracing::error!("Failed to fetch online users: {}", e);
        }
        result
    }

    pub async fn find_user(&self, user_id: &UserId) -> Result<Option<UserRecord>, DirectoryError> {
        let result = self.bounded(self.directory.find_user(user_id)).await;
        if let Err(e) = &result {
            tracing::error!(user_id = %user_id, "Failed to look up user: {}", e);
        }
        result
    }
}
