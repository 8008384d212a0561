//! Connection / presence entities.

use crate::domain::value_object::{ConnectionId, RoomId, UserId, Username};

/// A resolved user identity attached to a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: Username,
    /// `false` for anonymous guests
    pub authenticated: bool,
}

impl Identity {
    pub fn authenticated(user_id: UserId, username: Username) -> Self {
        Self {
            user_id,
            username,
            authenticated: true,
        }
    }

    /// Anonymous guest with a fresh user id.
    ///
    /// `username_hint` is used as the display name when it is a valid name,
    /// otherwise a `User_xxxxxxxxx` name is generated.
    pub fn guest(username_hint: Option<&str>) -> Self {
        let username = username_hint
            .and_then(|hint| Username::from_hint(hint).ok())
            .unwrap_or_else(Username::guest);
        Self {
            user_id: UserId::generate(),
            username,
            authenticated: false,
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            user_id: self.user_id.clone(),
            username: self.username.clone(),
        }
    }
}

/// Presence status shown in the online roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresenceStatus {
    #[default]
    Online,
}

impl PresenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
        }
    }
}

/// A live network session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub identity: Identity,
    pub current_room: Option<RoomId>,
    pub status: PresenceStatus,
}

impl Connection {
    pub fn new(id: ConnectionId, identity: Identity) -> Self {
        Self {
            id,
            identity,
            current_room: None,
            status: PresenceStatus::Online,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.identity.user_id
    }

    pub fn username(&self) -> &Username {
        &self.identity.username
    }
}

/// `{userId, username}` pair used by join/leave/typing events and room rosters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub user_id: UserId,
    pub username: Username,
}

/// Entry of the global online roster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlineUser {
    pub user_id: UserId,
    pub username: Username,
    pub status: PresenceStatus,
}
