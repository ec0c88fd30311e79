//! Persistence seam for identities and the revocation ledger.
//!
//! The authentication core only talks to [`CredentialStore`]; PostgreSQL backs it in
//! production and [`MemoryCredentialStore`] serves tests and embedded use.

use chrono::{DateTime, Utc};

use crate::auth::responses::Role;
use crate::auth::AuthResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// A registered principal as stored.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Fields supplied when creating an identity; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// A credential rejected before its natural expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationEntry {
    pub token: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[rocket::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Looks up a non-deleted identity. `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Identity>>;

    /// Fails with `AuthError::DuplicateEmail` when a live identity owns the email.
    async fn insert_identity(&self, identity: NewIdentity) -> AuthResult<Identity>;

    async fn record_login(&self, id: i32, at: DateTime<Utc>) -> AuthResult<()>;

    async fn admin_exists(&self) -> AuthResult<bool>;

    async fn find_revocation(&self, token: &str) -> AuthResult<bool>;

    /// Returns `false` when the token was already in the ledger.
    async fn insert_revocation(&self, entry: RevocationEntry) -> AuthResult<bool>;

    /// Purges entries whose recorded expiry is before `now`.
    async fn delete_expired_revocations(&self, now: DateTime<Utc>) -> AuthResult<u64>;
}

/// Emails compare case-insensitively; this is the canonical stored form.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
