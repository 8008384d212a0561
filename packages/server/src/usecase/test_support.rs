//! UseCase テスト用の共通部品

use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tsudoi_shared::time::{Clock, FixedClock};

use crate::{
    domain::{
        Connection, ConnectionId, FlushPolicy, Identity, MessagePusher, PresenceRepository,
        RoomId, RoomPersistence, RoomRepository, UserId, Username,
    },
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryPresenceRepository, InMemoryRoomRepository},
    },
};

use super::roster::RosterBroadcaster;

pub const FIXED_MILLIS: i64 = 1_700_000_000_000;

/// 受け取った保存要求を記録する
#[derive(Default)]
pub struct RecordingPersistence {
    requests: StdMutex<Vec<FlushPolicy>>,
}

impl RecordingPersistence {
    pub fn requests(&self) -> Vec<FlushPolicy> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RoomPersistence for RecordingPersistence {
    async fn persist(&self, policy: FlushPolicy) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(policy);
        }
    }
}

/// テスト用のクライアント（送信キューの受信側を保持）
pub struct TestClient {
    pub id: ConnectionId,
    pub identity: Identity,
    pub rx: mpsc::UnboundedReceiver<String>,
}

impl TestClient {
    /// 受信済みのフレームをすべて取り出す
    pub fn drain(&mut self) -> Vec<serde_json::Value> {
        let mut frames = Vec::new();
        while let Ok(raw) = self.rx.try_recv() {
            frames.push(serde_json::from_str(&raw).unwrap());
        }
        frames
    }

    /// 受信済みのフレームのイベント名
    pub fn drain_events(&mut self) -> Vec<String> {
        self.drain()
            .into_iter()
            .map(|frame| frame["event"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

pub struct TestEnv {
    pub rooms: Arc<dyn RoomRepository>,
    pub presence: Arc<dyn PresenceRepository>,
    pub pusher: Arc<dyn MessagePusher>,
    pub persistence: Arc<RecordingPersistence>,
    pub clock: Arc<dyn Clock>,
    pub roster: RosterBroadcaster,
}

impl TestEnv {
    pub fn new() -> Self {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::from_millis(FIXED_MILLIS));
        let rooms: Arc<dyn RoomRepository> = Arc::new(InMemoryRoomRepository::new(clock.clone()));
        let presence: Arc<dyn PresenceRepository> = Arc::new(InMemoryPresenceRepository::new());
        let pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());
        let roster = RosterBroadcaster::new(presence.clone(), rooms.clone(), pusher.clone());
        Self {
            rooms,
            presence,
            pusher,
            persistence: Arc::new(RecordingPersistence::default()),
            clock,
            roster,
        }
    }

    pub fn persistence(&self) -> Arc<dyn RoomPersistence> {
        self.persistence.clone()
    }

    /// 接続を登録する（user-connected などの初期通知は送らない）
    pub async fn connect(&self, user_id: &str, username: &str) -> TestClient {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ConnectionId::generate();
        let identity = Identity::authenticated(
            UserId::new(user_id.to_string()).unwrap(),
            Username::new(username.to_string()).unwrap(),
        );
        self.pusher.register_client(id, tx).await;
        self.presence
            .register(Connection::new(id, identity.clone()))
            .await;
        TestClient { id, identity, rx }
    }

    /// ルームを作成し、接続を入室状態にする（通知は送らない）
    pub async fn place_in_room(&self, client: &TestClient, room: &str) {
        let room_id = RoomId::new(room.to_string()).unwrap();
        let (handle, _) = self.rooms.get_or_create(&room_id).await;
        handle.lock().await.add_member(client.id);
        self.presence
            .set_current_room(&client.id, Some(room_id))
            .await
            .unwrap();
    }
}
