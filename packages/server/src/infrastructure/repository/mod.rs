//! Repository 実装
//!
//! - `inmemory`: プロセス内のメモリに保持する実装（永続化は `persistence` が担当）

pub mod inmemory;

pub use inmemory::{InMemoryPresenceRepository, InMemoryRoomRepository};
