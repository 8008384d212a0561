//! 接続時の本人確認
//!
//! - `jwt`: HS256 署名の JWT を検証する `IdentityVerifier` 実装

pub mod jwt;

pub use jwt::{JwtClaims, JwtIdentityVerifier};
