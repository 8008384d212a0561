//! UseCase layer
//!
//! クライアントから見える操作ごとに 1 つのユースケースを用意します。
//! ユースケースはドメイン層のポート（trait）にのみ依存します。
//!
//! ## ロックの規約
//!
//! - ルームの状態変更と、その結果の配信はルームのロックを保持したまま行う
//! - 2 つのルームのロックを同時に保持しない
//! - 即時保存（`FlushPolicy::Immediate`）はルームのロックを保持していないときだけ要求する

pub mod connect_client;
pub mod disconnect_client;
pub mod edit_document;
pub mod error;
pub mod get_rooms;
pub mod join_room;
pub mod leave_room;
pub mod restore_rooms;
pub mod roster;
mod session;
pub mod send_message;
pub mod typing;

#[cfg(test)]
pub(crate) mod test_support;

pub use connect_client::ConnectClientUseCase;
pub use disconnect_client::DisconnectClientUseCase;
pub use edit_document::EditDocumentUseCase;
pub use error::{EditDocumentError, GetRoomError, JoinRoomError, SendMessageError, SessionError};
pub use get_rooms::{GetRoomsUseCase, RoomDetail, RoomSummary};
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use restore_rooms::{DEFAULT_ROOMS, RestoreRoomsUseCase};
pub use roster::RosterBroadcaster;
pub use send_message::SendMessageUseCase;
pub use typing::TypingUseCase;
