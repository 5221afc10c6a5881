//! In-process user directory.
//!
//! Stands in for the document store that owns user records. Records are
//! created from seed data; presence updates for unknown users fail with
//! `DirectoryError::NotFound`, like an update-by-id on a missing document.

use std::{collections::HashMap, path::Path};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;

use clubroom_shared::time::rfc3339_to_timestamp;

use crate::domain::{
    DirectoryError, DisplayName, PresenceRecord, Role, Timestamp, UserDirectory, UserId,
    UserRecord, ValueObjectError,
};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read user seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse user seed file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid user record: {0}")]
    Invalid(#[from] ValueObjectError),
}

/// One user record in a seed file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedUser {
    #[serde(alias = "_id", alias = "userId")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub last_seen: Option<String>,
    #[serde(default)]
    pub chatroom_joined: bool,
}

impl TryFrom<SeedUser> for UserRecord {
    type Error = ValueObjectError;

    fn try_from(seed: SeedUser) -> Result<Self, Self::Error> {
        let last_seen = seed
            .last_seen
            .as_deref()
            .and_then(rfc3339_to_timestamp)
            .unwrap_or(0);
        Ok(Self {
            id: UserId::new(seed.id)?,
            name: DisplayName::new(seed.name)?,
            email: seed.email,
            role: seed.role,
            presence: PresenceRecord {
                is_online: seed.is_online,
                last_seen: Timestamp::new(last_seen),
                chatroom_joined: seed.chatroom_joined,
            },
        })
    }
}

#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<UserId, UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = UserRecord>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.id.clone(), u)).collect()),
        }
    }

    /// Build a directory from a JSON array of [`SeedUser`] records.
    pub fn from_json(json: &str) -> Result<Self, SeedError> {
        let seeds: Vec<SeedUser> = serde_json::from_str(json)?;
        let users = seeds
            .into_iter()
            .map(UserRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_users(users))
    }

    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, user_id: &UserId) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn update_presence(
        &self,
        user_id: &UserId,
        presence: PresenceRecord,
    ) -> Result<(), DirectoryError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| DirectoryError::NotFound(user_id.as_str().to_string()))?;
        user.presence = presence;
        Ok(())
    }

    async fn list_where_online(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        let users = self.users.read().await;
        let mut online: Vec<UserRecord> = users
            .values()
            .filter(|u| u.presence.is_online)
            .cloned()
            .collect();
        online.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(online)
    }
}
