//! Request-time enforcement: bearer extraction, revocation lookup, verification and
//! the admin role check, kept free of HTTP types so every step is testable directly.

use chrono::{DateTime, Utc};

use crate::auth::jwt::TokenService;
use crate::auth::responses::Role;
use crate::auth::store::CredentialStore;
use crate::auth::{AuthError, AuthResult};

/// Identity injected for downstream handlers once a request is authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub token: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

/// Splits `Bearer <token>`: exactly two space-separated parts, scheme matched literally.
pub fn bearer_token(header: Option<&str>) -> AuthResult<&str> {
    let header = header.ok_or(AuthError::MissingCredential)?;
    let parts: Vec<&str> = header.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] => Ok(*token),
        _ => Err(AuthError::MalformedHeader),
    }
}

/// Runs the gateway. The ledger is consulted before the signature, so a revoked token
/// is reported as revoked even after it has also expired.
pub async fn authenticate(
    store: &dyn CredentialStore,
    tokens: &TokenService,
    header: Option<&str>,
) -> AuthResult<AuthContext> {
    let token = bearer_token(header)?;

    if store.find_revocation(token).await? {
        return Err(AuthError::RevokedCredential);
    }

    let claims = tokens.verify(token)?;

    Ok(AuthContext {
        token: token.to_string(),
        email: claims.email,
        name: claims.name,
        role: claims.role,
        expires_at: claims.expires_at,
    })
}

pub fn require_admin(context: &AuthContext) -> AuthResult<()> {
    if context.is_admin() {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}
