//! Real-time chat and collaborative document server library.
//!
//! Rooms bundle a bounded message history, a shared text document, cursor
//! positions and live membership. Clients talk to the server over a
//! WebSocket; every mutation is applied under the room's lock, persisted
//! (debounced) and broadcast to the other members.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// configuration
pub mod config;
