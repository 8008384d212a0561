//! Domain entities.

mod connection;
mod message;
mod room;

pub use connection::{Connection, Identity, OnlineUser, PresenceStatus, UserSummary};
pub use message::{FileMetadata, Message, MessageBody, MessageKind};
pub use room::{Cursor, JOIN_HISTORY_LIMIT, MESSAGE_HISTORY_CAPACITY, Room};
