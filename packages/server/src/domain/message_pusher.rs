//! MessagePusher trait
//!
//! Abstraction over delivering room notices to connections. Implementations own
//! the per-connection outbound channels.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{error::MessagePushError, notice::RoomNotice, value_object::ConnectionId};

/// Outbound channel of one connection (serialized frames).
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    async fn unregister_client(&self, connection_id: &ConnectionId);

    async fn is_registered(&self, connection_id: &ConnectionId) -> bool;

    /// Deliver to a single connection.
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        notice: &RoomNotice,
    ) -> Result<(), MessagePushError>;

    /// Deliver to every listed connection. A failure for one target does not
    /// stop delivery to the others.
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        notice: &RoomNotice,
    ) -> Result<(), MessagePushError>;

    /// Deliver to every registered connection, joined or not.
    async fn broadcast_all(&self, notice: &RoomNotice) -> Result<(), MessagePushError>;
}
