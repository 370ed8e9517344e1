use crate::auth::{AuthError, AuthResult};

/// Ownership comparison strategy for mutating operations on owned resources.
///
/// `Email` matches the resource owner's email against the caller's email and
/// is the primary behavior. `Id` compares the stable UUIDs instead and exists
/// for deployments that key authorship by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipMode {
    Email,
    Id,
}

/// Authentication configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Base64-encoded HMAC signing secret. Decoded once at startup; a value
    /// that is not valid base64 aborts launch.
    pub jwt_secret: String,
    /// Token lifetime in minutes.
    pub token_ttl_minutes: i64,
    pub ownership_mode: OwnershipMode,
}

impl AuthConfig {
    pub fn from_env() -> AuthResult<Self> {
        let jwt_secret = std::env::var("BOOKSTORE_JWT_SECRET")
            .map_err(|_| AuthError::Config("BOOKSTORE_JWT_SECRET is required".into()))?;
        let token_ttl_minutes = std::env::var("BOOKSTORE_TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(60);
        let ownership_mode = match std::env::var("BOOKSTORE_OWNERSHIP_MODE").as_deref() {
            Ok("id") => OwnershipMode::Id,
            _ => OwnershipMode::Email,
        };

        Ok(Self {
            jwt_secret,
            token_ttl_minutes,
            ownership_mode,
        })
    }
}
