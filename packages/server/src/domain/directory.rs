//! User directory trait: the durable user store the room reads and writes presence through.

use async_trait::async_trait;

use super::{
    entity::UserRecord,
    error::DirectoryError,
    value_object::{PresenceRecord, UserId},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, user_id: &UserId) -> Result<Option<UserRecord>, DirectoryError>;

    async fn update_presence(
        &self,
        user_id: &UserId,
        presence: PresenceRecord,
    ) -> Result<(), DirectoryError>;

    /// All users whose `is_online` flag is set.
    async fn list_where_online(&self) -> Result<Vec<UserRecord>, DirectoryError>;
}
