//! Conversion logic between DTOs and domain entities.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tsudoi_shared::time::{parse_rfc3339, to_rfc3339_millis};

use crate::domain::{
    Cursor, DocumentError, DocumentOperation, FileMetadata, Message, MessageBody, MessageId,
    MessageText, Notification, OnlineUser, Room, RoomId, RoomSnapshot, UserId, UserSummary,
    Username, ValueObjectError,
};
use crate::infrastructure::dto::{snapshot, websocket as dto};

/// DTO → Domain 変換エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DtoConversionError {
    #[error(transparent)]
    ValueObject(#[from] ValueObjectError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("missing field '{0}'")]
    MissingField(&'static str),
}

// ========================================
// DTO → Domain Entity
// ========================================

impl TryFrom<dto::DocumentChangePayload> for DocumentOperation {
    type Error = DocumentError;

    fn try_from(payload: dto::DocumentChangePayload) -> Result<Self, Self::Error> {
        match payload.operation.as_str() {
            "insert" => Ok(Self::Insert {
                position: payload.position,
                text: payload.text.ok_or(DocumentError::MissingText)?,
            }),
            "delete" => Ok(Self::Delete {
                position: payload.position,
                length: payload.length.ok_or(DocumentError::MissingLength)?,
            }),
            other => Err(DocumentError::UnknownOperation(other.to_string())),
        }
    }
}

impl TryFrom<dto::FileUploadPayload> for FileMetadata {
    type Error = ValueObjectError;

    fn try_from(payload: dto::FileUploadPayload) -> Result<Self, Self::Error> {
        FileMetadata::new(
            payload.file_name,
            payload.file_url,
            payload.file_size,
            payload.file_type,
        )
    }
}

impl TryFrom<dto::MessageDto> for Message {
    type Error = DtoConversionError;

    fn try_from(dto: dto::MessageDto) -> Result<Self, Self::Error> {
        let body = match dto.kind {
            dto::MessageKindDto::Text => MessageBody::Text(MessageText::new(
                dto.text.ok_or(DtoConversionError::MissingField("text"))?,
            )?),
            dto::MessageKindDto::File => MessageBody::File(FileMetadata::new(
                dto.file_name
                    .ok_or(DtoConversionError::MissingField("fileName"))?,
                dto.file_url
                    .ok_or(DtoConversionError::MissingField("fileUrl"))?,
                dto.file_size.unwrap_or_default(),
                dto.file_type.unwrap_or_default(),
            )?),
        };
        let timestamp = parse_rfc3339(&dto.timestamp)
            .ok_or_else(|| DtoConversionError::InvalidTimestamp(dto.timestamp.clone()))?;

        Ok(Self {
            id: MessageId::new(dto.id)?,
            user_id: UserId::new(dto.user_id)?,
            username: Username::new(dto.username)?,
            body,
            timestamp,
            room_id: RoomId::new(dto.room_id)?,
        })
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&Message> for dto::MessageDto {
    fn from(model: &Message) -> Self {
        let mut dto = Self {
            id: model.id.as_str().to_string(),
            user_id: model.user_id.as_str().to_string(),
            username: model.username.as_str().to_string(),
            kind: dto::MessageKindDto::Text,
            text: None,
            file_name: None,
            file_url: None,
            file_size: None,
            file_type: None,
            timestamp: to_rfc3339_millis(&model.timestamp),
            room_id: model.room_id.as_str().to_string(),
        };
        match &model.body {
            MessageBody::Text(text) => {
                dto.text = Some(text.as_str().to_string());
            }
            MessageBody::File(file) => {
                dto.kind = dto::MessageKindDto::File;
                dto.file_name = Some(file.file_name.clone());
                dto.file_url = Some(file.file_url.clone());
                dto.file_size = Some(file.file_size);
                dto.file_type = Some(file.file_type.clone());
            }
        }
        dto
    }
}

impl From<&UserSummary> for dto::UserDto {
    fn from(model: &UserSummary) -> Self {
        Self {
            user_id: model.user_id.as_str().to_string(),
            username: model.username.as_str().to_string(),
        }
    }
}

impl From<&UserSummary> for dto::RoomUserDto {
    fn from(model: &UserSummary) -> Self {
        Self {
            id: model.user_id.as_str().to_string(),
            username: model.username.as_str().to_string(),
        }
    }
}

impl From<&OnlineUser> for dto::OnlineUserDto {
    fn from(model: &OnlineUser) -> Self {
        Self {
            id: model.user_id.as_str().to_string(),
            username: model.username.as_str().to_string(),
            status: model.status.as_str().to_string(),
        }
    }
}

pub fn cursor_to_dto(user_id: &UserId, cursor: &Cursor) -> dto::CursorDto {
    dto::CursorDto {
        user_id: user_id.as_str().to_string(),
        position: cursor.position,
        username: cursor.username.clone(),
        color: cursor.color.clone(),
    }
}

impl From<&RoomSnapshot> for dto::RoomJoinedDto {
    fn from(model: &RoomSnapshot) -> Self {
        Self {
            room_id: model.room_id.as_str().to_string(),
            content: model.content.clone(),
            messages: model.messages.iter().map(dto::MessageDto::from).collect(),
            cursors: model
                .cursors
                .iter()
                .map(|(user_id, cursor)| cursor_to_dto(user_id, cursor))
                .collect(),
        }
    }
}

fn document_updated(operation: &DocumentOperation, user_id: &UserId) -> dto::DocumentUpdatedDto {
    let (text, length) = match operation {
        DocumentOperation::Insert { text, .. } => (Some(text.clone()), None),
        DocumentOperation::Delete { length, .. } => (None, Some(*length)),
    };
    dto::DocumentUpdatedDto {
        operation: operation.kind().to_string(),
        position: operation.position(),
        text,
        length,
        user_id: user_id.as_str().to_string(),
    }
}

impl From<&Notification> for dto::ServerMessage {
    fn from(notification: &Notification) -> Self {
        match notification {
            Notification::UserConnected(user) => Self::UserConnected(user.into()),
            Notification::RoomsList(ids) => {
                Self::RoomsList(ids.iter().map(|id| id.as_str().to_string()).collect())
            }
            Notification::RoomJoined(snapshot) => Self::RoomJoined(snapshot.into()),
            Notification::MessagePosted(message) => Self::Message(message.into()),
            Notification::FileUploaded(message) => Self::FileUploaded(message.into()),
            Notification::UserTyping(user) => Self::UserTyping(user.into()),
            Notification::UserStoppedTyping(user) => Self::UserStoppedTyping(user.into()),
            Notification::DocumentUpdated { operation, user_id } => {
                Self::DocumentUpdated(document_updated(operation, user_id))
            }
            Notification::CursorUpdated {
                user_id,
                username,
                position,
                color,
            } => Self::CursorUpdated(dto::CursorUpdatedDto {
                user_id: user_id.as_str().to_string(),
                username: username.as_str().to_string(),
                position: *position,
                color: color.clone(),
            }),
            Notification::UserJoined(user) => Self::UserJoined(user.into()),
            Notification::UserLeft(user) => Self::UserLeft(user.into()),
            Notification::RoomUsersUpdated(users) => {
                Self::RoomUsersUpdated(users.iter().map(dto::RoomUserDto::from).collect())
            }
            Notification::OnlineUsersUpdated(users) => {
                Self::OnlineUsersUpdated(users.iter().map(dto::OnlineUserDto::from).collect())
            }
            Notification::Ack { ack_id, result } => Self::Ack(dto::AckDto {
                ack_id: *ack_id,
                success: result.is_ok(),
                error: result.as_ref().err().cloned(),
            }),
            Notification::Error { message } => Self::Error(dto::ErrorDto {
                message: message.clone(),
            }),
        }
    }
}

// ========================================
// Snapshot records
// ========================================

impl From<&Room> for snapshot::RoomRecord {
    fn from(room: &Room) -> Self {
        Self {
            users: room.members.iter().map(|id| id.to_string()).collect(),
            content: room.content().to_string(),
            cursors: room
                .cursors
                .iter()
                .map(|(user_id, cursor)| {
                    (
                        user_id.as_str().to_string(),
                        snapshot::CursorRecord {
                            position: cursor.position,
                            username: cursor.username.clone(),
                            color: cursor.color.clone(),
                        },
                    )
                })
                .collect(),
            messages: room.messages.iter().map(dto::MessageDto::from).collect(),
            created_at: Some(to_rfc3339_millis(&room.created_at)),
        }
    }
}

/// Rebuild a room from its snapshot record.
///
/// Invalid cursor and message entries are skipped with a warning; only an
/// invalid room id fails the whole record.
pub fn room_from_record(
    room_id: String,
    record: snapshot::RoomRecord,
    fallback_created_at: DateTime<Utc>,
) -> Result<Room, DtoConversionError> {
    let id = RoomId::new(room_id)?;
    let created_at = record
        .created_at
        .as_deref()
        .and_then(parse_rfc3339)
        .unwrap_or(fallback_created_at);

    let mut cursors = BTreeMap::new();
    for (user_id, cursor) in record.cursors {
        match UserId::new(user_id) {
            Ok(user_id) => {
                cursors.insert(
                    user_id,
                    Cursor {
                        position: cursor.position,
                        username: cursor.username,
                        color: cursor.color,
                    },
                );
            }
            Err(e) => tracing::warn!("Skipping cursor in room '{}': {}", id, e),
        }
    }

    let mut messages = Vec::with_capacity(record.messages.len());
    for message in record.messages {
        let message_id = message.id.clone();
        match Message::try_from(message) {
            Ok(message) => messages.push(message),
            Err(e) => tracing::warn!(
                "Skipping message '{}' in room '{}': {}",
                message_id,
                id,
                e
            ),
        }
    }

    Ok(Room::restore(
        id,
        created_at,
        record.content,
        cursors,
        messages,
    ))
}
