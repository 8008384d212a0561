//! 名簿（オンラインユーザー・ルーム一覧・ルームメンバー）の配信

use std::sync::Arc;

use crate::domain::{
    ConnectionId, MessagePusher, Notification, PresenceRepository, Room, RoomRepository,
};

/// 名簿の更新を配信する
///
/// UseCase 間で共有されるため `Clone` で受け渡す。
#[derive(Clone)]
pub struct RosterBroadcaster {
    presence: Arc<dyn PresenceRepository>,
    rooms: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RosterBroadcaster {
    pub fn new(
        presence: Arc<dyn PresenceRepository>,
        rooms: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            presence,
            rooms,
            message_pusher,
        }
    }

    /// オンラインユーザー一覧（userId で重複排除済み）を全接続に配信
    pub async fn broadcast_online_users(&self) {
        let users = self.presence.online_users().await;
        let targets = self.presence.connection_ids().await;
        self.send(&targets, &Notification::OnlineUsersUpdated(users))
            .await;
    }

    /// ルーム ID 一覧を全接続に配信
    pub async fn broadcast_rooms_list(&self) {
        let room_ids = self.rooms.room_ids().await;
        let targets = self.presence.connection_ids().await;
        self.send(&targets, &Notification::RoomsList(room_ids)).await;
    }

    /// ルームのメンバー一覧をルーム全体に配信
    ///
    /// 呼び出し元がルームのロックを保持したまま呼ぶ。
    pub async fn broadcast_room_users(&self, room: &Room) {
        let users = self.presence.summaries_of(&room.members).await;
        self.send(&room.members, &Notification::RoomUsersUpdated(users))
            .await;
    }

    async fn send(&self, targets: &[ConnectionId], notification: &Notification) {
        if let Err(e) = self.message_pusher.broadcast(targets, notification).await {
            tracing::warn!("Failed to broadcast '{}': {}", notification.name(), e);
        }
    }
}
