//! Authentication module: configuration, credential handling, token minting,
//! the revocation ledger, Rocket request guards, and HTTP route handlers.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod gateway;
pub mod guards;
pub mod jwt;
pub mod passwords;
pub mod responses;
pub mod routes;
pub mod service;
pub mod store;

pub use config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use gateway::AuthContext;
pub use guards::{AuthUser, BearerToken, RequireAdmin};
pub use jwt::TokenService;
pub use passwords::PasswordService;
pub use store::{CredentialStore, MemoryCredentialStore, PgCredentialStore};

#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub password_service: Arc<PasswordService>,
    pub token_service: Arc<TokenService>,
    pub store: Arc<dyn CredentialStore>,
}

impl AuthState {
    pub fn new(
        config: AuthConfig,
        password_service: PasswordService,
        token_service: TokenService,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            config,
            password_service: Arc::new(password_service),
            token_service: Arc::new(token_service),
            store,
        }
    }

    /// Builds every service from `config`; fails on an unusable secret or hasher setup.
    pub fn from_config(config: AuthConfig, store: Arc<dyn CredentialStore>) -> AuthResult<Self> {
        let token_service = TokenService::from_config(&config)?;
        let password_service = PasswordService::new()?;
        Ok(Self::new(config, password_service, token_service, store))
    }
}
