//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! ルームごとに `Arc<Mutex<Room>>` を持ち、ルーム一覧は `RwLock<HashMap>` で管理します。
//!
//! ルーム一覧のロックはハンドルの取得・追加の間だけ保持し、ルーム本体のロックとは
//! 同時に保持しません。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tsudoi_shared::time::Clock;

use crate::domain::{Room, RoomHandle, RoomId, RoomRepository};

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    rooms: RwLock<HashMap<RoomId, RoomHandle>>,
    /// ルーム作成時刻の取得元
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomRepository {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            clock,
        }
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn get_or_create(&self, room_id: &RoomId) -> (RoomHandle, bool) {
        if let Some(handle) = self.rooms.read().await.get(room_id) {
            return (handle.clone(), false);
        }

        let mut rooms = self.rooms.write().await;
        // read ロックを離している間に別タスクが作成している可能性がある
        if let Some(handle) = rooms.get(room_id) {
            return (handle.clone(), false);
        }
        let handle = Arc::new(Mutex::new(Room::new(room_id.clone(), self.clock.now())));
        rooms.insert(room_id.clone(), handle.clone());
        tracing::info!("Room '{}' created", room_id);
        (handle, true)
    }

    async fn find(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.read().await.get(room_id).cloned()
    }

    async fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self.rooms.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn snapshot(&self) -> Vec<Room> {
        let handles: Vec<RoomHandle> = {
            let rooms = self.rooms.read().await;
            let mut entries: Vec<(&RoomId, &RoomHandle)> = rooms.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            entries.into_iter().map(|(_, handle)| handle.clone()).collect()
        };

        let mut snapshot = Vec::with_capacity(handles.len());
        for handle in handles {
            snapshot.push(handle.lock().await.clone());
        }
        snapshot
    }

    async fn restore(&self, rooms: Vec<Room>) {
        let mut map = self.rooms.write().await;
        for room in rooms {
            map.insert(room.id.clone(), Arc::new(Mutex::new(room)));
        }
    }
}
