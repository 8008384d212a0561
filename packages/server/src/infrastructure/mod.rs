//! Infrastructure layer
//!
//! ドメイン層のポート（trait）の具体的な実装と、ワイヤーフォーマット（DTO）を提供します。

pub mod auth;
pub mod dto;
pub mod message_pusher;
pub mod persistence;
pub mod repository;
