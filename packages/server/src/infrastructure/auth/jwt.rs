//! JWT identity verification
//!
//! Tokens are HS256-signed and carry `{userId, username?, email?, exp}`.
//! The display name is `username`, else the local part of `email`, else a
//! generated guest name.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::domain::{AuthError, Identity, IdentityVerifier, UserId, Username};

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Expiration time (Unix timestamp, seconds)
    pub exp: u64,
}

impl JwtClaims {
    fn display_name(&self) -> Username {
        self.username
            .as_deref()
            .and_then(|name| Username::from_hint(name).ok())
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|email| email.split('@').next())
                    .and_then(|local| Username::from_hint(local).ok())
            })
            .unwrap_or_else(Username::guest)
    }
}

/// HS256 JWT verifier
pub struct JwtIdentityVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 60;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl IdentityVerifier for JwtIdentityVerifier {
    fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;
        let claims = data.claims;

        let user_id = claims
            .user_id
            .clone()
            .ok_or(AuthError::MissingClaim("userId"))
            .and_then(|id| UserId::new(id).map_err(|_| AuthError::MissingClaim("userId")))?;

        Ok(Identity::authenticated(user_id, claims.display_name()))
    }
}
