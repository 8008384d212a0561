//! UseCase: 共有ドキュメントの編集とカーソル更新
//!
//! 操作はサーバーへの到着順にそのまま適用されます（変換・リベースは行わない）。
//! 適用と配信はルームのロックを保持したまま行うため、各クライアントには
//! 適用順と同じ順序で操作が届きます。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, Cursor, DocumentOperation, FlushPolicy, MessagePusher, Notification,
    PresenceRepository, RoomPersistence, RoomRepository,
};

use super::{
    error::{EditDocumentError, SessionError},
    session::joined_room,
};

/// ドキュメント編集のユースケース
pub struct EditDocumentUseCase {
    rooms: Arc<dyn RoomRepository>,
    presence: Arc<dyn PresenceRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    persistence: Arc<dyn RoomPersistence>,
}

impl EditDocumentUseCase {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        presence: Arc<dyn PresenceRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        persistence: Arc<dyn RoomPersistence>,
    ) -> Self {
        Self {
            rooms,
            presence,
            message_pusher,
            persistence,
        }
    }

    /// ドキュメント操作を適用し、送信者以外のメンバーに配信する
    ///
    /// 全カーソルは操作に合わせて補正されます。
    pub async fn apply_operation(
        &self,
        connection_id: ConnectionId,
        operation: DocumentOperation,
    ) -> Result<(), EditDocumentError> {
        let joined =
            joined_room(self.presence.as_ref(), self.rooms.as_ref(), &connection_id).await?;

        {
            let mut room = joined.handle.lock().await;
            room.apply_operation(&operation);
            let notification = Notification::DocumentUpdated {
                operation,
                user_id: joined.connection.user_id().clone(),
            };
            let others = room.members_except(&connection_id);
            if let Err(e) = self.message_pusher.broadcast(&others, &notification).await {
                tracing::warn!("Failed to broadcast document-updated: {}", e);
            }
        }

        self.persistence.persist(FlushPolicy::Debounced).await;
        Ok(())
    }

    /// 送信者のカーソルを上書きし、送信者以外のメンバーに配信する
    ///
    /// 位置がドキュメントの範囲内かは検証しません。
    pub async fn update_cursor(
        &self,
        connection_id: ConnectionId,
        position: usize,
        color: String,
    ) -> Result<(), SessionError> {
        let joined =
            joined_room(self.presence.as_ref(), self.rooms.as_ref(), &connection_id).await?;
        let user_id = joined.connection.user_id().clone();
        let username = joined.connection.username().clone();

        let mut room = joined.handle.lock().await;
        room.set_cursor(
            user_id.clone(),
            Cursor {
                position,
                username: username.as_str().to_string(),
                color: color.clone(),
            },
        );
        let notification = Notification::CursorUpdated {
            user_id,
            username,
            position,
            color,
        };
        let others = room.members_except(&connection_id);
        if let Err(e) = self.message_pusher.broadcast(&others, &notification).await {
            tracing::warn!("Failed to broadcast cursor-updated: {}", e);
        }
        Ok(())
    }
}
