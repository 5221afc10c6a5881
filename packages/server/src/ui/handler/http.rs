//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    infrastructure::dto::{
        http::{ErrorResponse, HealthResponse, PostMessageRequest},
        websocket::{ChatMessageDto, OnlineUserDto, ParticipantDto},
    },
    ui::state::AppState,
    usecase::PostMessageError,
};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub async fn root() -> &'static str {
    "Clubroom API is running"
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Chat history, oldest first.
pub async fn get_messages(State(state): State<Arc<AppState>>) -> Json<Vec<ChatMessageDto>> {
    let messages = state.coordinator.history().await;
    Json(messages.iter().map(ChatMessageDto::from).collect())
}

/// Post a message without a WebSocket connection. It is broadcast to the room.
///
/// The post is queued on the room event loop like any WebSocket event, so it
/// never interleaves with a join in progress.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PostMessageRequest>,
) -> Result<(StatusCode, Json<ChatMessageDto>), ApiError> {
    match state.events.post_message(request.user, request.text).await {
        Ok(message) => Ok((StatusCode::CREATED, Json(ChatMessageDto::from(&message)))),
        Err(e @ PostMessageError::TextRequired) => {
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e @ PostMessageError::Invalid(_)) => {
            tracing::debug!("Rejected HTTP message: {}", e);
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e @ PostMessageError::Unavailable) => {
            tracing::error!("HTTP message not posted: {}", e);
            Err(api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
        }
    }
}

pub async fn get_online_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<OnlineUserDto>>, ApiError> {
    match state.coordinator.online_users().await {
        Ok(users) => Ok(Json(users.iter().map(OnlineUserDto::from).collect())),
        Err(_) => Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to fetch online users",
        )),
    }
}

/// Current chat room members, sorted by name then join time.
pub async fn get_participants(State(state): State<Arc<AppState>>) -> Json<Vec<ParticipantDto>> {
    let participants = state.coordinator.participants().await;
    Json(participants.iter().map(ParticipantDto::from).collect())
}
