//! UseCase: 起動時のルーム復元
//!
//! スナップショットを読み込んでルームを復元し、既定のルームがなければ作成します。
//! 作成したルームがあれば、接続を受け付ける前に即時保存します。

use std::sync::Arc;

use crate::domain::{RoomId, RoomRepository, SnapshotStore};

/// 起動時に必ず存在するルーム
pub const DEFAULT_ROOMS: [&str; 3] = ["general", "random", "development"];

/// 起動時のルーム復元のユースケース
pub struct RestoreRoomsUseCase {
    rooms: Arc<dyn RoomRepository>,
    store: Arc<dyn SnapshotStore>,
}

impl RestoreRoomsUseCase {
    pub fn new(rooms: Arc<dyn RoomRepository>, store: Arc<dyn SnapshotStore>) -> Self {
        Self { rooms, store }
    }

    /// ルームを復元する
    ///
    /// 読み込みや保存の失敗は記録するだけで、起動は続行します。
    ///
    /// # Returns
    ///
    /// 新たに作成した既定ルームの数
    pub async fn execute(&self) -> usize {
        match self.store.load().await {
            Ok(rooms) => {
                let count = rooms.len();
                self.rooms.restore(rooms).await;
                tracing::info!("Restored {} room(s) from snapshot", count);
            }
            Err(e) => {
                tracing::error!("Failed to load snapshot, starting empty: {}", e);
            }
        }

        let mut seeded = 0;
        for name in DEFAULT_ROOMS {
            let Ok(room_id) = RoomId::new(name.to_string()) else {
                continue;
            };
            let (_, created) = self.rooms.get_or_create(&room_id).await;
            if created {
                seeded += 1;
            }
        }

        if seeded > 0 {
            let rooms = self.rooms.snapshot().await;
            if let Err(e) = self.store.save(&rooms).await {
                tracing::error!("Failed to save seeded rooms: {}", e);
            }
        }
        seeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Document, PersistenceError, Room},
        infrastructure::{persistence::JsonFileSnapshotStore, repository::InMemoryRoomRepository},
    };
    use async_trait::async_trait;
    use tsudoi_shared::time::{Clock, FixedClock};

    struct BrokenStore;

    #[async_trait]
    impl SnapshotStore for BrokenStore {
        async fn load(&self) -> Result<Vec<Room>, PersistenceError> {
            Err(PersistenceError::Io(std::io::Error::other("unreadable")))
        }

        async fn save(&self, _rooms: &[Room]) -> Result<(), PersistenceError> {
            Err(PersistenceError::Io(std::io::Error::other("read-only")))
        }
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::from_millis(1_700_000_000_000))
    }

    #[tokio::test]
    async fn test_first_start_seeds_default_rooms_and_saves() {
        // テスト項目: スナップショットがない初回起動では既定ルームが作成され、保存される
        // given (前提条件):
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileSnapshotStore::new(dir.path(), clock()));
        let rooms = Arc::new(InMemoryRoomRepository::new(clock()));
        let usecase = RestoreRoomsUseCase::new(rooms.clone(), store.clone());

        // when (操作):
        let seeded = usecase.execute().await;

        // then (期待する結果):
        assert_eq!(seeded, 3);
        let ids: Vec<String> = rooms
            .room_ids()
            .await
            .into_iter()
            .map(RoomId::into_string)
            .collect();
        assert_eq!(ids, vec!["development", "general", "random"]);
        assert_eq!(store.load().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_restart_restores_content_without_reseeding() {
        // テスト項目: 再起動時は保存済みの内容が復元され、既定ルームは作り直されない
        // given (前提条件):
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileSnapshotStore::new(dir.path(), clock()));
        let first = Arc::new(InMemoryRoomRepository::new(clock()));
        RestoreRoomsUseCase::new(first.clone(), store.clone())
            .execute()
            .await;
        let general = RoomId::new("general".to_string()).unwrap();
        first.find(&general).await.unwrap().lock().await.document =
            Document::new("persisted".to_string());
        store.save(&first.snapshot().await).await.unwrap();

        // when (操作):
        let second = Arc::new(InMemoryRoomRepository::new(clock()));
        let seeded = RestoreRoomsUseCase::new(second.clone(), store)
            .execute()
            .await;

        // then (期待する結果):
        assert_eq!(seeded, 0);
        let room = second.find(&general).await.unwrap();
        assert_eq!(room.lock().await.content(), "persisted");
    }

    #[tokio::test]
    async fn test_unreadable_snapshot_starts_with_defaults() {
        // テスト項目: スナップショットの読み込み・保存に失敗しても既定ルームで起動できる
        // given (前提条件):
        let rooms = Arc::new(InMemoryRoomRepository::new(clock()));
        let usecase = RestoreRoomsUseCase::new(rooms.clone(), Arc::new(BrokenStore));

        // when (操作):
        let seeded = usecase.execute().await;

        // then (期待する結果):
        assert_eq!(seeded, 3);
        assert_eq!(rooms.room_ids().await.len(), 3);
    }
}
