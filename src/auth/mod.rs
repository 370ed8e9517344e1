//! Authentication module: configuration, credential handling, token minting,
//! Rocket request guards, ownership checks, and HTTP route handlers.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod guards;
pub mod jwt;
pub mod ownership;
pub mod passwords;
pub mod routes;
pub mod service;

pub use config::{AuthConfig, OwnershipMode};
pub use error::{AuthError, AuthResult};
pub use guards::{AuthUser, MaybeUser};
pub use jwt::JwtService;
pub use passwords::PasswordService;

#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub password_service: Arc<PasswordService>,
    pub jwt_service: Arc<JwtService>,
}

impl AuthState {
    pub fn new(config: AuthConfig, password_service: PasswordService, jwt_service: JwtService) -> Self {
        Self {
            config,
            password_service: Arc::new(password_service),
            jwt_service: Arc::new(jwt_service),
        }
    }

    /// Assemble the full auth state from the environment. A missing or
    /// malformed signing secret fails here, before the server starts serving.
    pub fn from_env() -> AuthResult<Self> {
        let config = AuthConfig::from_env()?;
        let password_service = PasswordService::new()?;
        let jwt_service = JwtService::from_config(&config)?;
        Ok(Self::new(config, password_service, jwt_service))
    }
}
