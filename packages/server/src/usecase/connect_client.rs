//! UseCase: クライアント接続処理
//!
//! 接続を Presence に登録し、本人に `user-connected` と `rooms-list` を送ってから
//! オンラインユーザー一覧を全接続に配信します。

use std::sync::Arc;

use crate::domain::{
    Connection, ConnectionId, Identity, MessagePushError, MessagePusher, Notification,
    PresenceRepository, PusherChannel, RoomRepository,
};

use super::roster::RosterBroadcaster;

/// クライアント接続のユースケース
pub struct ConnectClientUseCase {
    presence: Arc<dyn PresenceRepository>,
    rooms: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    roster: RosterBroadcaster,
}

impl ConnectClientUseCase {
    pub fn new(
        presence: Arc<dyn PresenceRepository>,
        rooms: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        roster: RosterBroadcaster,
    ) -> Self {
        Self {
            presence,
            rooms,
            message_pusher,
            roster,
        }
    }

    /// 接続処理を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 新しい接続の ID
    /// * `identity` - 検証済み（またはゲスト）の本人情報
    /// * `sender` - この接続への送信キュー
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        identity: Identity,
        sender: PusherChannel,
    ) -> Result<(), MessagePushError> {
        let summary = identity.summary();
        self.message_pusher
            .register_client(connection_id, sender)
            .await;
        self.presence
            .register(Connection::new(connection_id, identity))
            .await;

        self.message_pusher
            .push_to(&connection_id, &Notification::UserConnected(summary))
            .await?;
        let room_ids = self.rooms.room_ids().await;
        self.message_pusher
            .push_to(&connection_id, &Notification::RoomsList(room_ids))
            .await?;

        self.roster.broadcast_online_users().await;
        Ok(())
    }

    /// Presence レコードが失われた接続を同じ本人情報で登録し直す
    ///
    /// 入室状態は復元しないため、クライアントは再入室が必要です。
    pub async fn recover_session(&self, connection_id: ConnectionId, identity: Identity) {
        tracing::warn!(
            "Recreating session for connection '{}' ({})",
            connection_id,
            identity.username
        );
        self.presence
            .register(Connection::new(connection_id, identity))
            .await;
        self.roster.broadcast_online_users().await;
    }
}
