//! JSON file snapshot store.
//!
//! All rooms are written to a single pretty-printed JSON object keyed by room
//! id. Writes go to a temporary file first and are moved into place with a
//! rename, so a crash mid-write leaves the previous snapshot intact.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use tsudoi_shared::time::Clock;

use crate::{
    domain::{PersistenceError, Room, SnapshotStore},
    infrastructure::dto::{
        conversion::room_from_record,
        snapshot::{RoomRecord, SnapshotDocument},
    },
};

pub const SNAPSHOT_FILE_NAME: &str = "rooms.json";

pub struct JsonFileSnapshotStore {
    path: PathBuf,
    /// `createdAt` を持たない古いレコードの作成時刻
    clock: Arc<dyn Clock>,
}

impl JsonFileSnapshotStore {
    /// Store writing `<data_dir>/rooms.json`
    pub fn new(data_dir: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: data_dir.as_ref().join(SNAPSHOT_FILE_NAME),
            clock,
        }
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

#[async_trait]
impl SnapshotStore for JsonFileSnapshotStore {
    async fn load(&self) -> Result<Vec<Room>, PersistenceError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("No snapshot at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let document: SnapshotDocument = serde_json::from_str(&raw)?;
        let now = self.clock.now();
        let mut rooms = Vec::with_capacity(document.len());
        for (room_id, record) in document {
            match room_from_record(room_id.clone(), record, now) {
                Ok(room) => rooms.push(room),
                Err(e) => tracing::warn!("Skipping room '{}' in snapshot: {}", room_id, e),
            }
        }
        tracing::info!(
            "Loaded {} room(s) from {}",
            rooms.len(),
            self.path.display()
        );
        Ok(rooms)
    }

    async fn save(&self, rooms: &[Room]) -> Result<(), PersistenceError> {
        let document: SnapshotDocument = rooms
            .iter()
            .map(|room| (room.id.as_str().to_string(), RoomRecord::from(room)))
            .collect();
        let json = serde_json::to_string_pretty(&document)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, json).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        tracing::debug!("Saved {} room(s) to {}", rooms.len(), self.path.display());
        Ok(())
    }
}
