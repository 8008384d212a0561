//! Server configuration.
//!
//! The binary fills these from command-line flags and environment variables;
//! tests build them directly (usually with a temporary data directory).

use std::{path::PathBuf, time::Duration};

/// JWT secret used when none is configured. Only suitable for development.
pub const DEFAULT_JWT_SECRET: &str = "change-in-production";

/// Snapshot persistence settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceConfig {
    /// Directory holding `rooms.json`
    pub data_dir: PathBuf,
    /// Quiet period after the last mutation before a debounced save runs
    pub debounce: Duration,
    /// Interval of the periodic safety-net save
    pub save_interval: Duration,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            debounce: Duration::from_millis(2_000),
            save_interval: Duration::from_secs(300),
        }
    }
}

/// Runtime configuration of the chat server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// HS256 secret for connection tokens
    pub jwt_secret: String,
    /// Directory where `POST /api/upload` stores files
    pub uploads_dir: PathBuf,
    /// Request body limit of the upload endpoint
    pub max_upload_bytes: usize,
    pub persistence: PersistenceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            uploads_dir: PathBuf::from("./uploads"),
            max_upload_bytes: 10 * 1024 * 1024,
            persistence: PersistenceConfig::default(),
        }
    }
}

impl ServerConfig {
    /// `true` when the development secret is still in use
    pub fn uses_default_jwt_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}
