use std::fmt;

use crate::auth::{AuthError, AuthResult};

const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60 * 60;

/// Account created at boot when the store holds no admin yet.
#[derive(Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSeed")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authentication configuration loaded from environment variables.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub revocation_sweep_interval_secs: u64,
    pub admin_seed: Option<AdminSeed>,
}

impl AuthConfig {
    pub fn from_env() -> AuthResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AuthResult<Self> {
        let jwt_secret = lookup("TICKET_JWT_SECRET")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| AuthError::Config("TICKET_JWT_SECRET is required".into()))?;
        let token_ttl_secs = lookup("TICKET_TOKEN_TTL_SECS")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|ttl| *ttl > 0)
            .unwrap_or(DEFAULT_TOKEN_TTL_SECS);
        let revocation_sweep_interval_secs = lookup("TICKET_REVOCATION_SWEEP_INTERVAL_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS);

        let admin_seed = lookup("TICKET_ADMIN_PASSWORD")
            .filter(|value| !value.is_empty())
            .map(|password| AdminSeed {
                name: lookup("TICKET_ADMIN_NAME").unwrap_or_else(|| "Administrator".into()),
                email: lookup("TICKET_ADMIN_EMAIL").unwrap_or_else(|| "admin@localhost".into()),
                password,
            });

        Ok(Self {
            jwt_secret,
            token_ttl_secs,
            revocation_sweep_interval_secs,
            admin_seed,
        })
    }

    /// Configuration with a fixed secret and default lifetimes; used by tests and tools.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: secret.into(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            revocation_sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            admin_seed: None,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field(
                "revocation_sweep_interval_secs",
                &self.revocation_sweep_interval_secs,
            )
            .field("admin_seed", &self.admin_seed)
            .finish()
    }
}
