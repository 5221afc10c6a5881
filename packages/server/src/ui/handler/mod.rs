mod http;
mod websocket;

pub use http::{
    get_messages, get_online_users, get_participants, health_check, post_message, root,
};
pub use websocket::websocket_handler;
