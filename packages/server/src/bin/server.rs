//! Clubroom realtime chat server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin clubroom-server
//! cargo run --bin clubroom-server -- --host 0.0.0.0 --port 3000 --users-file users.json
//! ```

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use clubroom_server::{
    config::{ConfigError, ServerConfig},
    domain::{Room, UserDirectory},
    infrastructure::{
        directory::InMemoryUserDirectory, message_pusher::WebSocketMessagePusher,
        repository::InMemoryRoomRepository,
    },
    ui::Server,
    usecase::{ChatRoomCoordinator, DirectoryAdapter, RoomEventLoop},
};
use clubroom_shared::{logger::setup_logger, time::SystemClock};
use tokio::sync::Mutex;

#[derive(Parser, Debug)]
#[command(name = "clubroom-server")]
#[command(about = "Realtime presence and chat server for the club portal", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Number of chat messages kept in history
    #[arg(long, env = "CHAT_HISTORY_CAPACITY", default_value = "100")]
    history_capacity: usize,

    /// Upper bound for one user directory call, in milliseconds
    #[arg(long, env = "DIRECTORY_TIMEOUT_MS", default_value = "5000")]
    directory_timeout_ms: u64,

    /// JSON array of user records to seed the directory with
    #[arg(long, env = "USERS_FILE")]
    users_file: Option<PathBuf>,

    /// Reject joins from users the directory does not know
    #[arg(long, env = "REQUIRE_KNOWN_USER")]
    require_known_user: bool,

    /// Seconds between server pings
    #[arg(long, env = "PING_INTERVAL_SECS", default_value = "25")]
    ping_interval_secs: u64,

    /// Seconds of silence after which a connection is closed
    #[arg(long, env = "PING_TIMEOUT_SECS", default_value = "60")]
    ping_timeout_secs: u64,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            history_capacity: args.history_capacity,
            directory_timeout_ms: args.directory_timeout_ms,
            users_file: args.users_file,
            require_known_user: args.require_known_user,
            ping_interval_secs: args.ping_interval_secs,
            ping_timeout_secs: args.ping_timeout_secs,
            log_level: args.log_level,
        }
    }
}

async fn load_directory(config: &ServerConfig) -> Result<InMemoryUserDirectory, ConfigError> {
    match &config.users_file {
        Some(path) => {
            let directory = InMemoryUserDirectory::from_json_file(path).await?;
            tracing::info!(
                "Seeded user directory with {} users from {}",
                directory.len().await,
                path.display()
            );
            Ok(directory)
        }
        None => {
            tracing::info!("No users file given; starting with an empty user directory");
            Ok(InMemoryUserDirectory::new())
        }
    }
}

async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    // Initialize dependencies in order:
    // 1. Repository
    // 2. User directory and MessagePusher
    // 3. Coordinator and event loop
    // 4. Server

    // 1. Room state (in-memory)
    let room = Arc::new(Mutex::new(Room::with_history_capacity(
        config.history_capacity()?,
    )));
    let repository = Arc::new(InMemoryRoomRepository::new(room));

    // 2. User directory and MessagePusher (WebSocket implementation)
    let clock = Arc::new(SystemClock);
    let directory: Arc<dyn UserDirectory> = Arc::new(load_directory(&config).await?);
    let directory = Arc::new(DirectoryAdapter::new(
        directory,
        clock.clone(),
        config.directory_timeout(),
    ));
    let message_pusher = Arc::new(WebSocketMessagePusher::default());

    // 3. Coordinator and the single room worker
    let coordinator = Arc::new(
        ChatRoomCoordinator::new(repository, message_pusher, directory, clock)
            .require_known_user(config.require_known_user),
    );
    let (event_loop, events) = RoomEventLoop::new(coordinator.clone());
    let worker = event_loop.spawn();

    // 4. Server
    let server = Server::new(coordinator, events, config.liveness()?);
    server.run(&config.host, config.port).await?;

    worker.abort();
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = ServerConfig::from(args);
    tracing::debug!(?config, "Loaded configuration");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
