//! Domain layer: chat room state, presence model and the collaborator traits.
//!
//! Nothing here performs I/O. Infrastructure implements the traits declared in
//! `repository`, `directory` and `message_pusher`.

pub mod directory;
pub mod entity;
pub mod error;
pub mod message_log;
pub mod message_pusher;
pub mod notice;
pub mod repository;
pub mod room;
pub mod session_registry;
pub mod value_object;

pub use directory::UserDirectory;
pub use entity::{ChatMessage, MessageOrigin, NewMessage, Participant, UserProfile, UserRecord};
pub use error::{DirectoryError, MessagePushError, RegistryError, ValueObjectError};
pub use message_log::{DEFAULT_HISTORY_CAPACITY, MessageLog};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use notice::{RoomNotice, TypingState};
pub use repository::RoomRepository;
pub use room::Room;
pub use session_registry::SessionRegistry;
pub use value_object::{
    ConnectionId, DisplayName, MessageId, MessageText, PresenceRecord, Role, Timestamp, UserId,
};
