//! Shared handler state.

use std::sync::Arc;

use crate::{
    config::Liveness,
    usecase::{ChatRoomCoordinator, RoomEventSender},
};

/// Shared application state
pub struct AppState {
    /// Read paths (HTTP snapshots) and connection attach.
    pub coordinator: Arc<ChatRoomCoordinator>,
    /// Inbound room events go through the single worker.
    pub events: RoomEventSender,
    pub liveness: Liveness,
}
