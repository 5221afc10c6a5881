//! Use case layer: the chat room coordinator and its collaborators.

pub mod chat_room;
pub mod directory_adapter;
pub mod error;
pub mod event_loop;
pub mod presence_broadcaster;

pub use chat_room::{ChatRoomCoordinator, ConnectionState, JoinRequest, RoomEvent};
pub use directory_adapter::DirectoryAdapter;
pub use error::{JoinError, PostMessageError};
pub use event_loop::{RoomCommand, RoomEventLoop, RoomEventSender};
pub use presence_broadcaster::{PresenceBroadcaster, SnapshotTarget};
