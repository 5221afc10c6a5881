//! The chat room aggregate: Session Registry plus Message Log.

use std::num::NonZeroUsize;

use super::{
    entity::{ChatMessage, NewMessage},
    message_log::MessageLog,
    session_registry::SessionRegistry,
    value_object::MessageId,
};

/// The single global chat room.
///
/// Mutations go through `&mut self`; callers serialise access (the repository
/// keeps it behind a mutex), so each mutation is atomic.
#[derive(Debug, Clone, Default)]
pub struct Room {
    pub participants: SessionRegistry,
    pub messages: MessageLog,
    next_message_id: u64,
}

impl Room {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            participants: SessionRegistry::new(),
            messages: MessageLog::with_capacity(capacity),
            next_message_id: 0,
        }
    }

    /// Assign the next message id, append to the log and return the stored message.
    pub fn post_message(&mut self, message: NewMessage) -> ChatMessage {
        self.next_message_id += 1;
        let message = ChatMessage::from_new(MessageId::new(self.next_message_id), message);
        let evicted = self.messages.append(message.clone());
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted oldest messages from history");
        }
        message
    }
}
