//! Data Transfer Objects (DTOs) for the chat server.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket event frames (both directions)
//! - `http`: HTTP API response DTOs
//! - `snapshot`: on-disk snapshot records

pub mod conversion;
pub mod http;
pub mod snapshot;
pub mod websocket;
