//! Message Log: bounded, append-only chat history.

use std::{collections::VecDeque, num::NonZeroUsize};

use super::entity::ChatMessage;

/// Number of messages retained when no capacity is configured.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Ordered buffer of the most recent chat messages.
///
/// Appending beyond capacity evicts from the head, so the retained messages
/// are always the newest `capacity` ones in insertion order.
#[derive(Debug, Clone)]
pub struct MessageLog {
    messages: VecDeque<ChatMessage>,
    capacity: NonZeroUsize,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageLog {
    pub fn new() -> Self {
        Self::with_capacity(
            NonZeroUsize::new(DEFAULT_HISTORY_CAPACITY).unwrap_or(NonZeroUsize::MIN),
        )
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity.get()),
            capacity,
        }
    }

    /// Append a message at the tail, returning how many old messages were evicted.
    pub fn append(&mut self, message: ChatMessage) -> usize {
        self.messages.push_back(message);

        let mut evicted = 0;
        while self.messages.len() > self.capacity.get() {
            self.messages.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// All retained messages, oldest first.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}
