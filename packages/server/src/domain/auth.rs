//! Identity verification port.

use super::{AuthError, Identity};

/// Resolves a connection token into an identity.
///
/// Verification failure never rejects a connection; callers fall back to a
/// guest identity.
#[cfg_attr(test, mockall::automock)]
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}
