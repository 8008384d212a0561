//! InMemory Repository 実装

mod presence;
mod room;

pub use presence::InMemoryPresenceRepository;
pub use room::InMemoryRoomRepository;
