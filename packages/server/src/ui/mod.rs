//! UI layer
//!
//! axum のルーター、HTTP / WebSocket ハンドラ、共有状態を提供します。

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
pub use signal::shutdown_signal;
