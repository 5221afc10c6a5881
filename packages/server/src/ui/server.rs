//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Liveness,
    usecase::{ChatRoomCoordinator, RoomEventSender},
};

use super::{
    handler::{
        get_messages, get_online_users, get_participants, health_check, post_message, root,
        websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Realtime chat server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(coordinator, events, Liveness::default());
/// server.run("127.0.0.1", 8080).await?;
/// ```
pub struct Server {
    coordinator: Arc<ChatRoomCoordinator>,
    events: RoomEventSender,
    liveness: Liveness,
}

impl Server {
    pub fn new(
        coordinator: Arc<ChatRoomCoordinator>,
        events: RoomEventSender,
        liveness: Liveness,
    ) -> Self {
        Self {
            coordinator,
            events,
            liveness,
        }
    }

    /// Build the router with every endpoint and middleware layer.
    pub fn into_router(self) -> Router {
        let app_state = Arc::new(AppState {
            coordinator: self.coordinator,
            events: self.events,
            liveness: self.liveness,
        });

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/", get(root))
            // WebSocket endpoint
            .route("/ws", get(websocket_handler))
            // HTTP endpoints
            .route("/api/health", get(health_check))
            .route("/chat", get(get_messages).post(post_message))
            .route("/api/users/online", get(get_online_users))
            .route("/api/chat/participants", get(get_participants))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(app_state)
    }

    /// Bind to `host:port` and serve until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound or the server fails.
    pub async fn run(self, host: &str, port: u16) -> std::io::Result<()> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Clubroom server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        axum::serve(listener, self.into_router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}
