//! WebSocket event DTOs.
//!
//! Every text frame is `{"event": <name>, "data": <payload>}`. Client frames
//! may also carry `"ackId"`, answered with an `ack` event to the sender.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ========================================
// Client → Server
// ========================================

/// Raw client frame before the payload is interpreted
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(rename = "ackId", default)]
    pub ack_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessagePayload {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocumentChangePayload {
    pub operation: String,
    pub position: usize,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub length: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CursorUpdatePayload {
    pub position: usize,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadPayload {
    pub file_name: String,
    pub file_url: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub file_type: String,
}

/// A decoded client event
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    JoinRoom(String),
    Message(MessagePayload),
    TypingStart,
    TypingStop,
    DocumentChange(DocumentChangePayload),
    CursorUpdate(CursorUpdatePayload),
    FileUpload(FileUploadPayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    #[error("invalid payload for '{event}': {reason}")]
    InvalidPayload { event: String, reason: String },
}

impl ClientFrame {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::MalformedFrame(e.to_string()))
    }

    /// Interpret the payload according to the event name
    pub fn into_event(self) -> Result<ClientEvent, ProtocolError> {
        let ClientFrame { event, data, .. } = self;
        match event.as_str() {
            "join-room" => decode(&event, data).map(ClientEvent::JoinRoom),
            "message" => decode(&event, data).map(ClientEvent::Message),
            "typing-start" => Ok(ClientEvent::TypingStart),
            "typing-stop" => Ok(ClientEvent::TypingStop),
            "document-change" => decode(&event, data).map(ClientEvent::DocumentChange),
            "cursor-update" => decode(&event, data).map(ClientEvent::CursorUpdate),
            "file-upload" => decode(&event, data).map(ClientEvent::FileUpload),
            _ => Err(ProtocolError::UnknownEvent(event)),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    event: &str,
    data: serde_json::Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|e| ProtocolError::InvalidPayload {
        event: event.to_string(),
        reason: e.to_string(),
    })
}

// ========================================
// Server → Client
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKindDto {
    #[default]
    Text,
    File,
}

/// Chat message as sent to clients and stored in the snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: String,
    pub user_id: String,
    pub username: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKindDto,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    pub timestamp: String,
    pub room_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub user_id: String,
    pub username: String,
}

/// Room roster entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomUserDto {
    pub id: String,
    pub username: String,
}

/// Online roster entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnlineUserDto {
    pub id: String,
    pub username: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorDto {
    pub user_id: String,
    pub position: usize,
    pub username: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomJoinedDto {
    pub room_id: String,
    pub content: String,
    pub messages: Vec<MessageDto>,
    pub cursors: Vec<CursorDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpdatedDto {
    pub operation: String,
    pub position: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorUpdatedDto {
    pub user_id: String,
    pub username: String,
    pub position: usize,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckDto {
    pub ack_id: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDto {
    pub message: String,
}

/// Server → client frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    UserConnected(UserDto),
    RoomsList(Vec<String>),
    RoomJoined(RoomJoinedDto),
    Message(MessageDto),
    FileUploaded(MessageDto),
    UserTyping(UserDto),
    UserStoppedTyping(UserDto),
    DocumentUpdated(DocumentUpdatedDto),
    CursorUpdated(CursorUpdatedDto),
    UserJoined(UserDto),
    UserLeft(UserDto),
    RoomUsersUpdated(Vec<RoomUserDto>),
    OnlineUsersUpdated(Vec<OnlineUserDto>),
    Ack(AckDto),
    Error(ErrorDto),
}
