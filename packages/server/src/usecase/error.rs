//! UseCase 層のエラー
//!
//! エラーメッセージはそのまま `ack` / `error` イベントとして送信者に返されます。

use thiserror::Error;

use crate::domain::{DocumentError, ValueObjectError};

/// 接続のセッション状態に関するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// 接続の Presence レコードが見つからない（再作成して再入室を促す）
    #[error("Session not found. Please rejoin a room and try again.")]
    SessionMissing,

    #[error("Join a room first")]
    NotInRoom,

    #[error("Room '{0}' not found")]
    RoomNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinRoomError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Invalid room id: {0}")]
    InvalidRoomId(ValueObjectError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Message text cannot be empty")]
    EmptyText,

    #[error("Invalid file: {0}")]
    InvalidFile(ValueObjectError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditDocumentError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Invalid document operation: {0}")]
    InvalidOperation(#[from] DocumentError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomError {
    #[error("Room '{0}' not found")]
    NotFound(String),
}

impl SessionError {
    pub fn is_session_missing(&self) -> bool {
        matches!(self, Self::SessionMissing)
    }
}

impl JoinRoomError {
    pub fn is_session_missing(&self) -> bool {
        matches!(self, Self::Session(SessionError::SessionMissing))
    }
}

impl SendMessageError {
    pub fn is_session_missing(&self) -> bool {
        matches!(self, Self::Session(SessionError::SessionMissing))
    }
}

impl EditDocumentError {
    pub fn is_session_missing(&self) -> bool {
        matches!(self, Self::Session(SessionError::SessionMissing))
    }
}
