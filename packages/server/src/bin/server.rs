//! Tsudoi real-time chat and collaborative document server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tsudoi-server
//! cargo run --bin tsudoi-server -- --host 0.0.0.0 --port 3000 --data-dir ./data
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use tsudoi_server::{
    config::{DEFAULT_JWT_SECRET, PersistenceConfig, ServerConfig},
    ui::Server,
};
use tsudoi_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "tsudoi-server")]
#[command(about = "Real-time chat rooms with a shared document, over WebSocket", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "TSUDOI_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value = "3000")]
    port: u16,

    /// HS256 secret used to verify connection tokens
    #[arg(long, env = "JWT_SECRET", default_value = DEFAULT_JWT_SECRET, hide_env_values = true)]
    jwt_secret: String,

    /// Directory holding the room snapshot (rooms.json)
    #[arg(long, env = "TSUDOI_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// Directory where uploaded files are stored
    #[arg(long, env = "TSUDOI_UPLOADS_DIR", default_value = "./uploads")]
    uploads_dir: PathBuf,

    /// Quiet period (ms) after the last change before the snapshot is saved
    #[arg(long, env = "TSUDOI_SAVE_DEBOUNCE_MS", default_value = "2000")]
    save_debounce_ms: u64,

    /// Interval (s) of the periodic snapshot save
    #[arg(long, env = "TSUDOI_SAVE_INTERVAL_SECS", default_value = "300")]
    save_interval_secs: u64,

    /// Maximum upload size in bytes
    #[arg(long, env = "TSUDOI_MAX_UPLOAD_BYTES", default_value = "10485760")]
    max_upload_bytes: usize,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            jwt_secret: args.jwt_secret,
            uploads_dir: args.uploads_dir,
            max_upload_bytes: args.max_upload_bytes,
            persistence: PersistenceConfig {
                data_dir: args.data_dir,
                debounce: Duration::from_millis(args.save_debounce_ms),
                save_interval: Duration::from_secs(args.save_interval_secs.max(1)),
            },
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let config = ServerConfig::from(Args::parse());
    if config.uses_default_jwt_secret() {
        tracing::warn!("JWT_SECRET is not set; using the development secret");
    }

    let server = Server::build(&config, Arc::new(SystemClock)).await;
    if let Err(e) = server.run(config.host.clone(), config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
