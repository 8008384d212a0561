//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::post_message() / post_file() メソッド
//!
//! ### なぜこのテストが必要か
//! - 送信者を含むルーム全員にメッセージが配信されること
//! - メッセージ履歴が上限を超えたら古い順に破棄されること
//! - 不正な入力では履歴も配信も変化しないこと
//!
//! ### どのような状況を想定しているか
//! - 正常系：テキストメッセージ・ファイル通知の送信
//! - 異常系：空白のみの本文、未入室、セッションなし
//! - エッジケース：履歴が上限に達している場合

use std::sync::Arc;

use tsudoi_shared::time::Clock;

use crate::domain::{
    ConnectionId, FileMetadata, FlushPolicy, Message, MessageBody, MessageKind, MessagePusher,
    MessageText, Notification, PresenceRepository, RoomPersistence, RoomRepository,
};

use super::{
    error::SendMessageError,
    session::{JoinedRoom, joined_room},
};

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    rooms: Arc<dyn RoomRepository>,
    presence: Arc<dyn PresenceRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    persistence: Arc<dyn RoomPersistence>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        presence: Arc<dyn PresenceRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        persistence: Arc<dyn RoomPersistence>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rooms,
            presence,
            message_pusher,
            persistence,
            clock,
        }
    }

    /// テキストメッセージを投稿
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 送信者の接続
    /// * `text` - 本文（前後の空白は除去される）
    ///
    /// # Returns
    ///
    /// * `Ok(Message)` - 履歴に追加され配信されたメッセージ
    /// * `Err(SendMessageError)` - 送信者にのみ返すエラー（配信・履歴の変更なし）
    pub async fn post_message(
        &self,
        connection_id: ConnectionId,
        text: String,
    ) -> Result<Message, SendMessageError> {
        let joined = joined_room(self.presence.as_ref(), self.rooms.as_ref(), &connection_id)
            .await?;
        let text = MessageText::new(text).map_err(|_| SendMessageError::EmptyText)?;

        let message = self
            .append_and_broadcast(joined, MessageBody::Text(text))
            .await;
        tracing::info!(
            "Message sent by '{}' in '{}'",
            message.username,
            message.room_id
        );
        Ok(message)
    }

    /// アップロード済みファイルの通知を投稿
    pub async fn post_file(
        &self,
        connection_id: ConnectionId,
        file: FileMetadata,
    ) -> Result<Message, SendMessageError> {
        let joined = joined_room(self.presence.as_ref(), self.rooms.as_ref(), &connection_id)
            .await?;

        let message = self
            .append_and_broadcast(joined, MessageBody::File(file))
            .await;
        tracing::info!(
            "File shared by '{}' in '{}'",
            message.username,
            message.room_id
        );
        Ok(message)
    }

    /// 履歴に追加し、ルームのロックを保持したまま全メンバーに配信する
    async fn append_and_broadcast(
        &self,
        joined: JoinedRoom,
        body: MessageBody,
    ) -> Message {
        let message = Message::new(
            joined.connection.user_id().clone(),
            joined.connection.username().clone(),
            body,
            self.clock.now(),
            joined.room_id,
        );
        let notification = match message.kind() {
            MessageKind::Text => Notification::MessagePosted(message.clone()),
            MessageKind::File => Notification::FileUploaded(message.clone()),
        };

        {
            let mut room = joined.handle.lock().await;
            let evicted = room.push_message(message.clone());
            if evicted > 0 {
                tracing::debug!("Evicted {} message(s) from '{}'", evicted, room.id);
            }
            if let Err(e) = self
                .message_pusher
                .broadcast(&room.members, &notification)
                .await
            {
                tracing::warn!("Failed to broadcast '{}': {}", notification.name(), e);
            }
        }

        self.persistence.persist(FlushPolicy::Debounced).await;
        message
    }
}
