//! On-disk snapshot records.
//!
//! The snapshot is one JSON object keyed by room id:
//!
//! ```json
//! {
//!   "general": {
//!     "users": ["<connection id>", "..."],
//!     "content": "shared text",
//!     "cursors": { "<userId>": { "position": 3, "username": "alice", "color": "#f00" } },
//!     "messages": [ { "id": "...", "type": "text", "text": "hi", "...": "..." } ]
//!   }
//! }
//! ```
//!
//! `users` is written for reference only; membership is connection-scoped
//! and is reset to empty on load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::websocket::MessageDto;

/// Room id → room record
pub type SnapshotDocument = BTreeMap<String, RoomRecord>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord {
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub cursors: BTreeMap<String, CursorRecord>,
    #[serde(default)]
    pub messages: Vec<MessageDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorRecord {
    #[serde(default)]
    pub position: usize,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub color: String,
}
