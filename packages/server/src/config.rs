//! Server configuration.
//!
//! The binary fills a [`ServerConfig`] from CLI flags and environment
//! variables; everything below the binary only sees this struct.

use std::{num::NonZeroUsize, path::PathBuf, time::Duration};

use thiserror::Error;

use crate::{domain::DEFAULT_HISTORY_CAPACITY, infrastructure::directory::SeedError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("history capacity must be greater than zero")]
    ZeroHistoryCapacity,

    #[error("ping interval must be greater than zero")]
    ZeroPingInterval,

    #[error("ping timeout ({timeout}s) must be longer than the ping interval ({interval}s)")]
    PingTimeoutTooShort { interval: u64, timeout: u64 },

    #[error(transparent)]
    UsersFile(#[from] SeedError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Messages kept in the chat history.
    pub history_capacity: usize,
    /// Upper bound for one user directory call.
    pub directory_timeout_ms: u64,
    /// Optional JSON array used to seed the in-memory user directory.
    pub users_file: Option<PathBuf>,
    /// Reject joins from users the directory does not know.
    pub require_known_user: bool,
    pub ping_interval_secs: u64,
    /// A connection silent for this long is closed.
    pub ping_timeout_secs: u64,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            directory_timeout_ms: 5000,
            users_file: None,
            require_known_user: false,
            ping_interval_secs: 25,
            ping_timeout_secs: 60,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.history_capacity()?;
        self.liveness()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn history_capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.history_capacity).ok_or(ConfigError::ZeroHistoryCapacity)
    }

    pub fn directory_timeout(&self) -> Duration {
        Duration::from_millis(self.directory_timeout_ms)
    }

    pub fn liveness(&self) -> Result<Liveness, ConfigError> {
        if self.ping_interval_secs == 0 {
            return Err(ConfigError::ZeroPingInterval);
        }
        if self.ping_timeout_secs <= self.ping_interval_secs {
            return Err(ConfigError::PingTimeoutTooShort {
                interval: self.ping_interval_secs,
                timeout: self.ping_timeout_secs,
            });
        }
        Ok(Liveness {
            ping_interval: Duration::from_secs(self.ping_interval_secs),
            ping_timeout: Duration::from_secs(self.ping_timeout_secs),
        })
    }
}

/// Transport keep-alive settings for WebSocket connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Liveness {
    pub ping_interval: Duration,
    pub ping_timeout: Duration,
}

impl Default for Liveness {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(25),
            ping_timeout: Duration::from_secs(60),
        }
    }
}
