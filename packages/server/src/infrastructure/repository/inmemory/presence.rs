//! InMemory Presence Repository 実装
//!
//! 接続ごとのセッション情報（ID・表示名・現在のルーム）を保持します。
//! 同じユーザーが複数の接続を持つ場合、オンライン一覧では最後に接続したものを採用します。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Connection, ConnectionId, OnlineUser, PresenceRepository, RepositoryError, RoomId,
    UserSummary,
};

struct Entry {
    /// 登録順
    sequence: u64,
    connection: Connection,
}

#[derive(Default)]
struct Registry {
    next_sequence: u64,
    entries: HashMap<ConnectionId, Entry>,
}

/// インメモリ Presence Repository 実装
#[derive(Default)]
pub struct InMemoryPresenceRepository {
    registry: Mutex<Registry>,
}

impl InMemoryPresenceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PresenceRepository for InMemoryPresenceRepository {
    async fn register(&self, connection: Connection) {
        let mut registry = self.registry.lock().await;
        let sequence = registry.next_sequence;
        registry.next_sequence += 1;
        tracing::debug!(
            "Connection '{}' registered as '{}'",
            connection.id,
            connection.username()
        );
        registry.entries.insert(
            connection.id,
            Entry {
                sequence,
                connection,
            },
        );
    }

    async fn get(&self, connection_id: &ConnectionId) -> Option<Connection> {
        let registry = self.registry.lock().await;
        registry
            .entries
            .get(connection_id)
            .map(|entry| entry.connection.clone())
    }

    async fn remove(&self, connection_id: &ConnectionId) -> Option<Connection> {
        let mut registry = self.registry.lock().await;
        registry
            .entries
            .remove(connection_id)
            .map(|entry| entry.connection)
    }

    async fn set_current_room(
        &self,
        connection_id: &ConnectionId,
        room_id: Option<RoomId>,
    ) -> Result<(), RepositoryError> {
        let mut registry = self.registry.lock().await;
        let entry = registry
            .entries
            .get_mut(connection_id)
            .ok_or_else(|| RepositoryError::ConnectionNotFound(connection_id.to_string()))?;
        entry.connection.current_room = room_id;
        Ok(())
    }

    async fn connection_ids(&self) -> Vec<ConnectionId> {
        let registry = self.registry.lock().await;
        let mut entries: Vec<&Entry> = registry.entries.values().collect();
        entries.sort_by_key(|entry| entry.sequence);
        entries.into_iter().map(|entry| entry.connection.id).collect()
    }

    async fn online_users(&self) -> Vec<OnlineUser> {
        let registry = self.registry.lock().await;
        let mut entries: Vec<&Entry> = registry.entries.values().collect();
        entries.sort_by(|a, b| b.sequence.cmp(&a.sequence));

        let mut seen = HashSet::new();
        let mut users: Vec<OnlineUser> = entries
            .into_iter()
            .filter(|entry| seen.insert(entry.connection.user_id().clone()))
            .map(|entry| OnlineUser {
                user_id: entry.connection.user_id().clone(),
                username: entry.connection.username().clone(),
                status: entry.connection.status,
            })
            .collect();
        users.reverse();
        users
    }

    async fn summaries_of(&self, connection_ids: &[ConnectionId]) -> Vec<UserSummary> {
        let registry = self.registry.lock().await;
        connection_ids
            .iter()
            .filter_map(|id| registry.entries.get(id))
            .map(|entry| entry.connection.identity.summary())
            .collect()
    }
}
