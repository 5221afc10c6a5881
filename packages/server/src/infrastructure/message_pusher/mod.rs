//! Message delivery implementations.
//!
//! - `websocket`: per-connection unbounded channels drained by the WebSocket handler

pub mod websocket;

pub use websocket::WebSocketMessagePusher;
