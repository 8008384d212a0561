//! Room entity
//!
//! ルームはメッセージ履歴・共有ドキュメント・カーソル・接続中メンバーを束ねる単位です。
//! ルームは一度作成されると、メンバーが全員退出しても削除されません。

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::{DateTime, Utc};

use crate::domain::{
    document::{Document, DocumentOperation, shift_cursor},
    entity::message::Message,
    value_object::{ConnectionId, RoomId, UserId},
};

/// ルームが保持するメッセージ履歴の上限（超過分は古い順に破棄）
pub const MESSAGE_HISTORY_CAPACITY: usize = 500;

/// 入室時にクライアントへ送るメッセージ数の上限
pub const JOIN_HISTORY_LIMIT: usize = 100;

/// ドキュメント内のユーザーごとのカーソル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub position: usize,
    pub username: String,
    pub color: String,
}

/// Room エンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    /// 入室中の接続（入室順）
    pub members: Vec<ConnectionId>,
    pub document: Document,
    pub cursors: BTreeMap<UserId, Cursor>,
    pub messages: VecDeque<Message>,
    /// 入力中のユーザー（永続化しない）
    pub typing: BTreeSet<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// 空のルームを作成
    pub fn new(id: RoomId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            members: Vec::new(),
            document: Document::default(),
            cursors: BTreeMap::new(),
            messages: VecDeque::new(),
            typing: BTreeSet::new(),
            created_at,
        }
    }

    /// スナップショットからルームを復元（メンバーは空で始まる）
    pub fn restore(
        id: RoomId,
        created_at: DateTime<Utc>,
        content: String,
        cursors: BTreeMap<UserId, Cursor>,
        messages: Vec<Message>,
    ) -> Self {
        let mut room = Self::new(id, created_at);
        room.document = Document::new(content);
        room.cursors = cursors;
        for message in messages {
            room.push_message(message);
        }
        room
    }

    pub fn content(&self) -> &str {
        self.document.as_str()
    }

    pub fn has_member(&self, connection_id: &ConnectionId) -> bool {
        self.members.contains(connection_id)
    }

    /// メンバーを追加。既に入室済みなら `false`
    pub fn add_member(&mut self, connection_id: ConnectionId) -> bool {
        if self.has_member(&connection_id) {
            return false;
        }
        self.members.push(connection_id);
        true
    }

    /// メンバーを削除。入室していなければ `false`
    pub fn remove_member(&mut self, connection_id: &ConnectionId) -> bool {
        let before = self.members.len();
        self.members.retain(|id| id != connection_id);
        self.members.len() != before
    }

    /// 指定した接続以外のメンバー
    pub fn members_except(&self, exclude: &ConnectionId) -> Vec<ConnectionId> {
        self.members
            .iter()
            .filter(|id| *id != exclude)
            .copied()
            .collect()
    }

    /// メッセージを履歴に追加し、上限を超えた分を古い順に破棄する
    ///
    /// # Returns
    ///
    /// 破棄したメッセージ数
    pub fn push_message(&mut self, message: Message) -> usize {
        self.messages.push_back(message);
        let mut evicted = 0;
        while self.messages.len() > MESSAGE_HISTORY_CAPACITY {
            self.messages.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// 直近 `limit` 件のメッセージ（到着順）
    pub fn recent_messages(&self, limit: usize) -> Vec<Message> {
        let skip = self.messages.len().saturating_sub(limit);
        self.messages.iter().skip(skip).cloned().collect()
    }

    /// ドキュメント操作を適用し、全カーソルを補正する
    pub fn apply_operation(&mut self, operation: &DocumentOperation) {
        self.document.apply(operation);
        for cursor in self.cursors.values_mut() {
            cursor.position = shift_cursor(cursor.position, operation);
        }
    }

    pub fn set_cursor(&mut self, user_id: UserId, cursor: Cursor) {
        self.cursors.insert(user_id, cursor);
    }

    pub fn remove_cursor(&mut self, user_id: &UserId) -> Option<Cursor> {
        self.cursors.remove(user_id)
    }

    /// 入力中にする。既に入力中なら `false`
    pub fn start_typing(&mut self, user_id: UserId) -> bool {
        self.typing.insert(user_id)
    }

    /// 入力中を解除する。入力中でなかったなら `false`
    pub fn stop_typing(&mut self, user_id: &UserId) -> bool {
        self.typing.remove(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entity::message::MessageBody,
        value_object::{MessageText, Username},
    };
    use chrono::TimeZone;

    fn room_id(value: &str) -> RoomId {
        RoomId::new(value.to_string()).unwrap()
    }

    fn created_at() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
    }

    fn text_message(room: &RoomId, text: &str) -> Message {
        Message::new(
            UserId::new("alice".to_string()).unwrap(),
            Username::new("Alice".to_string()).unwrap(),
            MessageBody::Text(MessageText::new(text.to_string()).unwrap()),
            created_at(),
            room.clone(),
        )
    }

    fn cursor(position: usize) -> Cursor {
        Cursor {
            position,
            username: "Bob".to_string(),
            color: "#ff0000".to_string(),
        }
    }

    #[test]
    fn test_push_message_evicts_oldest_first() {
        // テスト項目: 上限を超えると最も古いメッセージから破棄される（FIFO）
        // given (前提条件):
        let id = room_id("general");
        let mut room = Room::new(id.clone(), created_at());
        for i in 0..MESSAGE_HISTORY_CAPACITY {
            room.push_message(text_message(&id, &format!("message {}", i)));
        }

        // when (操作):
        let evicted = room.push_message(text_message(&id, "overflow"));

        // then (期待する結果):
        assert_eq!(evicted, 1);
        assert_eq!(room.messages.len(), MESSAGE_HISTORY_CAPACITY);
        let first = room.messages.front().unwrap();
        assert_eq!(first.body, MessageBody::Text(MessageText::new("message 1".to_string()).unwrap()));
        let last = room.messages.back().unwrap();
        assert_eq!(last.body, MessageBody::Text(MessageText::new("overflow".to_string()).unwrap()));
    }

    #[test]
    fn test_recent_messages_returns_tail_in_order() {
        // テスト項目: 直近 N 件が到着順で返され、件数が少なければ全件が返される
        // given (前提条件):
        let id = room_id("general");
        let mut room = Room::new(id.clone(), created_at());
        for i in 0..150 {
            room.push_message(text_message(&id, &format!("m{}", i)));
        }
        let mut small = Room::new(id.clone(), created_at());
        small.push_message(text_message(&id, "only"));

        // when (操作):
        let recent = room.recent_messages(JOIN_HISTORY_LIMIT);
        let small_recent = small.recent_messages(JOIN_HISTORY_LIMIT);

        // then (期待する結果):
        assert_eq!(recent.len(), JOIN_HISTORY_LIMIT);
        let expected: Vec<Message> = room.messages.iter().skip(50).cloned().collect();
        assert_eq!(recent, expected);
        assert_eq!(small_recent.len(), 1);
    }

    #[test]
    fn test_apply_operation_shifts_all_cursors() {
        // テスト項目: ドキュメント操作の適用でルーム内の全カーソルが補正される
        // given (前提条件):
        let mut room = Room::new(room_id("doc"), created_at());
        room.document = Document::new("abcdef".to_string());
        let alice = UserId::new("alice".to_string()).unwrap();
        let bob = UserId::new("bob".to_string()).unwrap();
        room.set_cursor(alice.clone(), cursor(5));
        room.set_cursor(bob.clone(), cursor(1));

        // when (操作):
        room.apply_operation(&DocumentOperation::Insert {
            position: 3,
            text: "XY".to_string(),
        });

        // then (期待する結果):
        assert_eq!(room.content(), "abcXYdef");
        assert_eq!(room.cursors[&alice].position, 7);
        assert_eq!(room.cursors[&bob].position, 1);
    }

    #[test]
    fn test_apply_operation_with_cursor_at_max_position() {
        // テスト項目: usize::MAX のカーソルがあっても操作が適用され、カーソルは上限に留まる
        // given (前提条件):
        let mut room = Room::new(room_id("doc"), created_at());
        room.document = Document::new("abc".to_string());
        let mallory = UserId::new("mallory".to_string()).unwrap();
        room.set_cursor(mallory.clone(), cursor(usize::MAX));

        // when (操作):
        room.apply_operation(&DocumentOperation::Insert {
            position: 0,
            text: "x".to_string(),
        });

        // then (期待する結果):
        assert_eq!(room.content(), "xabc");
        assert_eq!(room.cursors[&mallory].position, usize::MAX);
    }

    #[test]
    fn test_members_are_unique_and_removable() {
        // テスト項目: 同じ接続は二重に追加されず、削除後は members_except から外れる
        // given (前提条件):
        let mut room = Room::new(room_id("general"), created_at());
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();

        // when (操作):
        let first = room.add_member(a);
        let duplicate = room.add_member(a);
        room.add_member(b);
        let removed = room.remove_member(&a);
        let removed_again = room.remove_member(&a);

        // then (期待する結果):
        assert!(first);
        assert!(!duplicate);
        assert!(removed);
        assert!(!removed_again);
        assert_eq!(room.members, vec![b]);
        assert!(room.members_except(&b).is_empty());
    }

    #[test]
    fn test_restore_keeps_content_and_drops_members() {
        // テスト項目: 復元したルームはドキュメント・カーソル・履歴を保持し、メンバーは空になる
        // given (前提条件):
        let id = room_id("general");
        let mut cursors = BTreeMap::new();
        cursors.insert(UserId::new("bob".to_string()).unwrap(), cursor(2));
        let messages = vec![text_message(&id, "hi")];

        // when (操作):
        let room = Room::restore(
            id.clone(),
            created_at(),
            "shared".to_string(),
            cursors.clone(),
            messages.clone(),
        );

        // then (期待する結果):
        assert_eq!(room.content(), "shared");
        assert_eq!(room.cursors, cursors);
        assert_eq!(room.messages.iter().cloned().collect::<Vec<_>>(), messages);
        assert!(room.members.is_empty());
    }

    #[test]
    fn test_typing_flags() {
        // テスト項目: 入力中フラグは重複せず、解除時は入力中だった場合のみ true
        // given (前提条件):
        let mut room = Room::new(room_id("general"), created_at());
        let alice = UserId::new("alice".to_string()).unwrap();

        // when (操作):
        let started = room.start_typing(alice.clone());
        let started_again = room.start_typing(alice.clone());
        let stopped = room.stop_typing(&alice);
        let stopped_again = room.stop_typing(&alice);

        // then (期待する結果):
        assert!(started);
        assert!(!started_again);
        assert!(stopped);
        assert!(!stopped_again);
    }
}
