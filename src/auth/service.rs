//! Account flows composed from the hasher, token service and credential store.

use std::sync::{Arc, LazyLock};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use regex::Regex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::auth::gateway::bearer_token;
use crate::auth::responses::{LoginRequest, LoginResponse, RegisterRequest, Role, UserSummary};
use crate::auth::store::{
    normalize_email, CredentialStore, Identity, NewIdentity, RevocationEntry,
};
use crate::auth::{AuthError, AuthResult, AuthState};

pub const MIN_PASSWORD_LEN: usize = 6;
const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 100;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles")
});

pub fn validate_email(email: &str) -> AuthResult<()> {
    if email.len() > MAX_EMAIL_LEN || !EMAIL_RE.is_match(email) {
        return Err(AuthError::Validation("a valid email is required".into()));
    }
    Ok(())
}

pub fn validate_registration(name: &str, email: &str, password: &str) -> AuthResult<()> {
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(AuthError::Validation(format!(
            "name is required and must be at most {MAX_NAME_LEN} characters"
        )));
    }
    validate_email(email)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Creates a `user` identity. Registration never issues a token.
pub async fn register(state: &AuthState, request: &RegisterRequest) -> AuthResult<Identity> {
    let name = request.name.trim();
    let email = normalize_email(&request.email);
    validate_registration(name, &email, &request.password)?;

    let password_hash = state.password_service.hash_password(&request.password)?;
    let identity = state
        .store
        .insert_identity(NewIdentity {
            name: name.to_string(),
            email,
            password_hash,
            role: Role::User,
        })
        .await?;

    log::info!("registered user id={} email={}", identity.id, identity.email);
    Ok(identity)
}

/// Unknown email and wrong password both surface as `InvalidCredentials`.
pub async fn login(state: &AuthState, request: &LoginRequest) -> AuthResult<LoginResponse> {
    let email = normalize_email(&request.email);
    validate_email(&email)?;
    if request.password.is_empty() {
        return Err(AuthError::Validation("password is required".into()));
    }

    let Some(identity) = state.store.find_by_email(&email).await? else {
        state.password_service.verify_absent(&request.password)?;
        log::debug!("login rejected: unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    if !state
        .password_service
        .verify_password(&request.password, &identity.password_hash)?
    {
        log::debug!("login rejected: password mismatch for id={}", identity.id);
        return Err(AuthError::InvalidCredentials);
    }

    let access_token = state.token_service.issue(&identity)?;

    if let Err(err) = state.store.record_login(identity.id, Utc::now()).await {
        log::warn!("failed to record login for id={}: {}", identity.id, err);
    }

    Ok(LoginResponse {
        token: access_token.token,
        user: UserSummary {
            id: identity.id,
            email: identity.email,
            role: identity.role,
            name: identity.name,
        },
    })
}

/// Revokes the presented credential. Returns `false` when it was already revoked.
///
/// The token is verified before anything is written, so invalid or expired tokens never
/// reach the ledger. A sweep of expired entries is detached afterwards.
pub async fn logout(state: &AuthState, authorization: Option<&str>) -> AuthResult<bool> {
    let token = bearer_token(authorization)?;
    let claims = state.token_service.verify(token)?;

    let inserted = state
        .store
        .insert_revocation(RevocationEntry {
            token: token.to_string(),
            email: claims.email.clone(),
            expires_at: claims.expires_at,
            created_at: Utc::now(),
        })
        .await?;

    if !inserted {
        log::debug!("token for {} was already revoked", claims.email);
    }

    spawn_revocation_sweep(Arc::clone(&state.store));
    Ok(inserted)
}

pub async fn sweep_expired_revocations(
    store: &dyn CredentialStore,
    now: DateTime<Utc>,
) -> AuthResult<u64> {
    let deleted = store.delete_expired_revocations(now).await?;
    log::debug!("revocation sweep removed {} expired entries", deleted);
    Ok(deleted)
}

/// Fire-and-forget sweep; failures are logged and dropped.
pub fn spawn_revocation_sweep(store: Arc<dyn CredentialStore>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(err) = sweep_expired_revocations(store.as_ref(), Utc::now()).await {
            log::warn!("revocation sweep failed: {}", err);
        }
    })
}

/// Periodic sweep for processes where logouts are rare.
pub async fn run_revocation_sweeper(store: Arc<dyn CredentialStore>, every: StdDuration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(err) = sweep_expired_revocations(store.as_ref(), Utc::now()).await {
            log::warn!("scheduled revocation sweep failed: {}", err);
        }
    }
}

/// Creates the configured admin account when the store has no admin.
pub async fn seed_admin(state: &AuthState) -> AuthResult<Option<Identity>> {
    if state.store.admin_exists().await? {
        return Ok(None);
    }

    let Some(seed) = state.config.admin_seed.as_ref() else {
        log::warn!("no admin account exists and TICKET_ADMIN_PASSWORD is not set");
        return Ok(None);
    };

    let name = seed.name.trim();
    let email = normalize_email(&seed.email);
    validate_registration(name, &email, &seed.password)?;

    let password_hash = state.password_service.hash_password(&seed.password)?;
    match state
        .store
        .insert_identity(NewIdentity {
            name: name.to_string(),
            email,
            password_hash,
            role: Role::Admin,
        })
        .await
    {
        Ok(identity) => {
            log::info!("seeded admin account {}", identity.email);
            Ok(Some(identity))
        }
        Err(AuthError::DuplicateEmail) => {
            log::warn!("admin seed skipped: {} already belongs to a non-admin account", seed.email);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
