//! Chat message entity.

use chrono::{DateTime, Utc};

use crate::domain::{
    error::ValueObjectError,
    value_object::{MessageId, MessageText, RoomId, UserId, Username},
};

/// Metadata of a file that was uploaded through the HTTP side channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub file_name: String,
    pub file_url: String,
    pub file_size: u64,
    pub file_type: String,
}

impl FileMetadata {
    pub fn new(
        file_name: String,
        file_url: String,
        file_size: u64,
        file_type: String,
    ) -> Result<Self, ValueObjectError> {
        if file_name.trim().is_empty() {
            return Err(ValueObjectError::FileFieldEmpty("fileName"));
        }
        if file_url.trim().is_empty() {
            return Err(ValueObjectError::FileFieldEmpty("fileUrl"));
        }
        Ok(Self {
            file_name,
            file_url,
            file_size,
            file_type,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    File,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::File => "file",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Text(MessageText),
    File(FileMetadata),
}

/// An immutable chat message stored in a room's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub user_id: UserId,
    pub username: Username,
    pub body: MessageBody,
    pub timestamp: DateTime<Utc>,
    pub room_id: RoomId,
}

impl Message {
    /// Create a message with a fresh unique id.
    pub fn new(
        user_id: UserId,
        username: Username,
        body: MessageBody,
        timestamp: DateTime<Utc>,
        room_id: RoomId,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            user_id,
            username,
            body,
            timestamp,
            room_id,
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self.body {
            MessageBody::Text(_) => MessageKind::Text,
            MessageBody::File(_) => MessageKind::File,
        }
    }
}
