//! Domain layer
//!
//! ビジネスルール（ルーム・メッセージ・ドキュメント操作・プレゼンス）と、
//! 上位層が依存するポート（trait）を定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

pub mod auth;
pub mod document;
pub mod entity;
pub mod error;
pub mod notification;
pub mod persistence;
pub mod pusher;
pub mod repository;
pub mod value_object;

pub use auth::IdentityVerifier;
pub use document::{Document, DocumentOperation, shift_cursor};
pub use entity::{
    Connection, Cursor, FileMetadata, Identity, JOIN_HISTORY_LIMIT, MESSAGE_HISTORY_CAPACITY,
    Message, MessageBody, MessageKind, OnlineUser, PresenceStatus, Room, UserSummary,
};
pub use error::{
    AuthError, DocumentError, MessagePushError, PersistenceError, RepositoryError,
    ValueObjectError,
};
pub use notification::{Notification, RoomSnapshot};
pub use persistence::{FlushPolicy, RoomPersistence, SnapshotStore};
pub use pusher::{MessagePusher, PusherChannel};
pub use repository::{PresenceRepository, RoomHandle, RoomRepository};
pub use value_object::{ConnectionId, MessageId, MessageText, RoomId, UserId, Username};
