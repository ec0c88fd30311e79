use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::auth::responses::Role;
use crate::auth::store::{CredentialStore, Identity, NewIdentity, RevocationEntry};
use crate::auth::{AuthError, AuthResult};

/// In-process store backed by sharded concurrent maps.
///
/// Identities are keyed by id and never removed; `live_emails` indexes the non-deleted
/// ones by normalized email. Revocations are keyed by the raw token.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    identities: Arc<DashMap<i32, Identity>>,
    live_emails: Arc<DashMap<String, i32>>,
    revocations: Arc<DashMap<String, RevocationEntry>>,
    next_id: Arc<AtomicI32>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revocation_count(&self) -> usize {
        self.revocations.len()
    }

    /// Sets the soft-deletion marker and frees the email; the record itself is kept.
    pub fn mark_deleted(&self, email: &str, at: DateTime<Utc>) -> bool {
        let Some((_, id)) = self.live_emails.remove(email) else {
            return false;
        };
        if let Some(mut identity) = self.identities.get_mut(&id) {
            identity.deleted_at = Some(at);
            identity.updated_at = at;
        }
        true
    }
}

#[rocket::async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Identity>> {
        let Some(id) = self.live_emails.get(email).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self
            .identities
            .get(&id)
            .filter(|identity| identity.deleted_at.is_none())
            .map(|identity| identity.value().clone()))
    }

    async fn insert_identity(&self, identity: NewIdentity) -> AuthResult<Identity> {
        match self.live_emails.entry(identity.email.clone()) {
            Entry::Occupied(_) => Err(AuthError::DuplicateEmail),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let created = Identity {
                    id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
                    name: identity.name,
                    email: identity.email,
                    password_hash: identity.password_hash,
                    role: identity.role,
                    created_at: now,
                    updated_at: now,
                    last_login_at: None,
                    deleted_at: None,
                };
                self.identities.insert(created.id, created.clone());
                slot.insert(created.id);
                Ok(created)
            }
        }
    }

    async fn record_login(&self, id: i32, at: DateTime<Utc>) -> AuthResult<()> {
        if let Some(mut identity) = self.identities.get_mut(&id) {
            identity.last_login_at = Some(at);
            identity.updated_at = at;
        }
        Ok(())
    }

    async fn admin_exists(&self) -> AuthResult<bool> {
        Ok(self
            .identities
            .iter()
            .any(|entry| entry.role == Role::Admin && entry.deleted_at.is_none()))
    }

    async fn find_revocation(&self, token: &str) -> AuthResult<bool> {
        Ok(self.revocations.contains_key(token))
    }

    async fn insert_revocation(&self, entry: RevocationEntry) -> AuthResult<bool> {
        match self.revocations.entry(entry.token.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(true)
            }
        }
    }

    async fn delete_expired_revocations(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut deleted = 0u64;
        self.revocations.retain(|_, entry| {
            let keep = entry.expires_at >= now;
            if !keep {
                deleted += 1;
            }
            keep
        });
        Ok(deleted)
    }
}
