//! UseCase: 入力中インジケーター
//!
//! 入力中の状態はルームごとに保持し、永続化しません。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, Notification, PresenceRepository, RoomRepository};

use super::{error::SessionError, session::joined_room};

/// 入力中インジケーターのユースケース
pub struct TypingUseCase {
    rooms: Arc<dyn RoomRepository>,
    presence: Arc<dyn PresenceRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl TypingUseCase {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        presence: Arc<dyn PresenceRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            rooms,
            presence,
            message_pusher,
        }
    }

    /// 入力開始を他のメンバーに通知
    pub async fn start(&self, connection_id: ConnectionId) -> Result<(), SessionError> {
        let joined =
            joined_room(self.presence.as_ref(), self.rooms.as_ref(), &connection_id).await?;
        let user = joined.connection.identity.summary();

        let mut room = joined.handle.lock().await;
        room.start_typing(user.user_id.clone());
        let others = room.members_except(&connection_id);
        if let Err(e) = self
            .message_pusher
            .broadcast(&others, &Notification::UserTyping(user))
            .await
        {
            tracing::warn!("Failed to broadcast user-typing: {}", e);
        }
        Ok(())
    }

    /// 入力終了を他のメンバーに通知（入力中でなければ何もしない）
    pub async fn stop(&self, connection_id: ConnectionId) -> Result<(), SessionError> {
        let joined =
            joined_room(self.presence.as_ref(), self.rooms.as_ref(), &connection_id).await?;
        let user = joined.connection.identity.summary();

        let mut room = joined.handle.lock().await;
        if !room.stop_typing(&user.user_id) {
            return Ok(());
        }
        let others = room.members_except(&connection_id);
        if let Err(e) = self
            .message_pusher
            .broadcast(&others, &Notification::UserStoppedTyping(user))
            .await
        {
            tracing::warn!("Failed to broadcast user-stopped-typing: {}", e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::TestEnv;

    fn create_usecase(env: &TestEnv) -> TypingUseCase {
        TypingUseCase::new(env.rooms.clone(), env.presence.clone(), env.pusher.clone())
    }

    #[tokio::test]
    async fn test_typing_start_and_stop() {
        // テスト項目: 入力開始・終了が送信者以外のメンバーに通知される
        // given (前提条件):
        let env = TestEnv::new();
        let mut alice = env.connect("u1", "alice").await;
        let mut bob = env.connect("u2", "bob").await;
        env.place_in_room(&alice, "general").await;
        env.place_in_room(&bob, "general").await;
        let usecase = create_usecase(&env);

        // when (操作):
        usecase.start(alice.id).await.unwrap();
        usecase.stop(alice.id).await.unwrap();

        // then (期待する結果):
        assert!(alice.drain().is_empty());
        assert_eq!(
            bob.drain(),
            vec![
                serde_json::json!({"event": "user-typing", "data": {"userId": "u1", "username": "alice"}}),
                serde_json::json!({"event": "user-stopped-typing", "data": {"userId": "u1", "username": "alice"}}),
            ]
        );
    }

    #[tokio::test]
    async fn test_typing_stop_without_start_is_silent() {
        // テスト項目: 入力中でないユーザーの typing-stop は配信されない
        // given (前提条件):
        let env = TestEnv::new();
        let alice = env.connect("u1", "alice").await;
        let mut bob = env.connect("u2", "bob").await;
        env.place_in_room(&alice, "general").await;
        env.place_in_room(&bob, "general").await;
        let usecase = create_usecase(&env);

        // when (操作):
        let result = usecase.stop(alice.id).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert!(bob.drain().is_empty());
    }

    #[tokio::test]
    async fn test_typing_without_room() {
        // テスト項目: 未入室の接続の入力通知は NotInRoom になる
        // given (前提条件):
        let env = TestEnv::new();
        let alice = env.connect("u1", "alice").await;
        let usecase = create_usecase(&env);

        // when (操作):
        let result = usecase.start(alice.id).await;

        // then (期待する結果):
        assert_eq!(result, Err(SessionError::NotInRoom));
    }
}
