use chrono::{DateTime, Utc};
use rocket_db_pools::sqlx::postgres::PgRow;
use rocket_db_pools::sqlx::{self, PgPool, Row};

use crate::auth::responses::Role;
use crate::auth::store::{CredentialStore, Identity, NewIdentity, RevocationEntry};
use crate::auth::{AuthError, AuthResult};

const UNIQUE_VIOLATION: &str = "23505";

const IDENTITY_COLUMNS: &str =
    "id, name, email, password_hash, role, created_at, updated_at, last_login_at, deleted_at";

#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[rocket::async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Identity>> {
        let row = sqlx::query(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM users WHERE lower(email) = lower($1) AND deleted_at IS NULL"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(identity_from_row).transpose()
    }

    async fn insert_identity(&self, identity: NewIdentity) -> AuthResult<Identity> {
        let result = sqlx::query(&format!(
            "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING {IDENTITY_COLUMNS}"
        ))
        .bind(&identity.name)
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(identity.role.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => identity_from_row(&row),
            Err(err) if is_unique_violation(&err) => Err(AuthError::DuplicateEmail),
            Err(err) => Err(AuthError::from(err)),
        }
    }

    async fn record_login(&self, id: i32, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE users SET last_login_at = $1, updated_at = $1 WHERE id = $2")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn admin_exists(&self) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE role = 'admin' AND deleted_at IS NULL)",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn find_revocation(&self, token: &str) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE token = $1)",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_revocation(&self, entry: RevocationEntry) -> AuthResult<bool> {
        let result = sqlx::query(
            "INSERT INTO revoked_tokens (token, email, expires_at, created_at) VALUES ($1, $2, $3, $4) ON CONFLICT (token) DO NOTHING",
        )
        .bind(&entry.token)
        .bind(&entry.email)
        .bind(entry.expires_at)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_expired_revocations(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn identity_from_row(row: &PgRow) -> AuthResult<Identity> {
    let role_str: String = row.try_get("role")?;
    let role = Role::parse(&role_str)
        .ok_or_else(|| AuthError::Internal(format!("unknown role '{role_str}' in users table")))?;

    Ok(Identity {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        last_login_at: row.try_get("last_login_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err
                .code()
                .map(|code| code == UNIQUE_VIOLATION)
                .unwrap_or(false)
    )
}
