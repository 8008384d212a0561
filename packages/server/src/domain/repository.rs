//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## ルーム単位の排他
//!
//! `RoomRepository` はルームごとに `Mutex` で保護されたハンドルを返します。
//! ルームへの変更とそのブロードキャストは同じロックの中で行うため、
//! 「到着順 = 適用順 = 配信順」が保たれます。
//! 同時に 2 つのルームのロックを保持してはいけません。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{
    Connection, ConnectionId, OnlineUser, RepositoryError, Room, RoomId, UserSummary,
};

/// 排他制御付きのルーム
pub type RoomHandle = Arc<Mutex<Room>>;

/// Room Registry
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// ルームを取得。存在しなければ作成する
    ///
    /// # Returns
    ///
    /// `(ハンドル, 新規作成したかどうか)`
    async fn get_or_create(&self, room_id: &RoomId) -> (RoomHandle, bool);

    /// ルームを取得
    async fn find(&self, room_id: &RoomId) -> Option<RoomHandle>;

    /// 全ルーム ID（昇順）
    async fn room_ids(&self) -> Vec<RoomId>;

    /// 全ルームの複製（永続化用）
    async fn snapshot(&self) -> Vec<Room>;

    /// 起動時にルームを登録する（同じ ID のルームは置き換える）
    async fn restore(&self, rooms: Vec<Room>);
}

/// Presence Tracker
#[async_trait]
pub trait PresenceRepository: Send + Sync {
    /// 接続を登録（同じ ID があれば置き換える）
    async fn register(&self, connection: Connection);

    async fn get(&self, connection_id: &ConnectionId) -> Option<Connection>;

    async fn remove(&self, connection_id: &ConnectionId) -> Option<Connection>;

    /// 接続の現在のルームを更新
    async fn set_current_room(
        &self,
        connection_id: &ConnectionId,
        room_id: Option<RoomId>,
    ) -> Result<(), RepositoryError>;

    /// 接続中の全ての接続 ID
    async fn connection_ids(&self) -> Vec<ConnectionId>;

    /// オンライン一覧（userId で重複排除し、最後に接続したものを採用）
    async fn online_users(&self) -> Vec<OnlineUser>;

    /// 指定した接続のユーザー情報（存在しない接続は除外、順序は引数に従う）
    async fn summaries_of(&self, connection_ids: &[ConnectionId]) -> Vec<UserSummary>;
}
