//! Persistence ports.
//!
//! `SnapshotStore` reads and writes the full room set. `RoomPersistence` is
//! what use cases call after a mutation; the flush policy is chosen per call
//! site.

use async_trait::async_trait;

use super::{PersistenceError, Room};

/// When a requested save hits the disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Write now and wait for completion
    Immediate,
    /// Coalesce with other requests; write once activity settles
    Debounced,
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read every persisted room. A missing snapshot is an empty set.
    async fn load(&self) -> Result<Vec<Room>, PersistenceError>;

    /// Overwrite the snapshot with `rooms`.
    async fn save(&self, rooms: &[Room]) -> Result<(), PersistenceError>;
}

#[async_trait]
pub trait RoomPersistence: Send + Sync {
    /// Request a save of the current room state.
    ///
    /// Failures are logged by the implementation and never reported back;
    /// in-memory state stays authoritative.
    async fn persist(&self, policy: FlushPolicy);
}
