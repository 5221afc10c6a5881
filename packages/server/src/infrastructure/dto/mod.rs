//! Data Transfer Objects (DTOs) for the chat service.
//!
//! DTOs are organized by protocol:
//! - `websocket`: realtime channel events
//! - `http`: HTTP API request and response bodies

pub mod conversion;
pub mod http;
pub mod websocket;
