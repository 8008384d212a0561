//! Server → client notifications in domain terms.
//!
//! Use cases decide *what* is sent to *whom*; the message pusher
//! implementation decides how a notification is encoded on the wire.

use crate::domain::{
    document::DocumentOperation,
    entity::{Cursor, Message, OnlineUser, UserSummary},
    value_object::{RoomId, UserId, Username},
};

/// State handed to a connection that has just joined a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub content: String,
    /// Most recent messages, oldest first
    pub messages: Vec<Message>,
    pub cursors: Vec<(UserId, Cursor)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    UserConnected(UserSummary),
    RoomsList(Vec<RoomId>),
    RoomJoined(RoomSnapshot),
    MessagePosted(Message),
    FileUploaded(Message),
    UserTyping(UserSummary),
    UserStoppedTyping(UserSummary),
    DocumentUpdated {
        operation: DocumentOperation,
        user_id: UserId,
    },
    CursorUpdated {
        user_id: UserId,
        username: Username,
        position: usize,
        color: String,
    },
    UserJoined(UserSummary),
    UserLeft(UserSummary),
    RoomUsersUpdated(Vec<UserSummary>),
    OnlineUsersUpdated(Vec<OnlineUser>),
    /// Reply on the acknowledgement channel
    Ack {
        ack_id: u64,
        result: Result<(), String>,
    },
    Error {
        message: String,
    },
}

impl Notification {
    /// Event name used for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserConnected(_) => "user-connected",
            Self::RoomsList(_) => "rooms-list",
            Self::RoomJoined(_) => "room-joined",
            Self::MessagePosted(_) => "message",
            Self::FileUploaded(_) => "file-uploaded",
            Self::UserTyping(_) => "user-typing",
            Self::UserStoppedTyping(_) => "user-stopped-typing",
            Self::DocumentUpdated { .. } => "document-updated",
            Self::CursorUpdated { .. } => "cursor-updated",
            Self::UserJoined(_) => "user-joined",
            Self::UserLeft(_) => "user-left",
            Self::RoomUsersUpdated(_) => "room-users-updated",
            Self::OnlineUsersUpdated(_) => "online-users-updated",
            Self::Ack { .. } => "ack",
            Self::Error { .. } => "error",
        }
    }
}
