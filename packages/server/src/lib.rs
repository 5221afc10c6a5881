//! Realtime presence and chat service for the club portal.
//!
//! One global chat room: connections join with a user profile, receive the
//! recent history and the room membership, exchange messages and typing
//! notices, and leave. Presence flags are written through to a user
//! directory so that users outside the room can see who is online.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
