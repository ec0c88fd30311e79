use std::sync::OnceLock;

use argon2::{
    password_hash::SaltString, Algorithm, Argon2, ParamsBuilder, PasswordHash, PasswordHasher,
    PasswordVerifier, Version,
};
use rand::RngCore;

use crate::auth::{AuthError, AuthResult};

const SALT_LEN: usize = 16;
const ABSENT_ACCOUNT_PASSWORD: &str = "no-such-account";

/// Argon2id hasher shared by registration, login and the provisioning CLI.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
    pub(super) absent_digest: OnceLock<String>,
}

impl PasswordService {
    pub fn new() -> AuthResult<Self> {
        let mut builder = ParamsBuilder::new();
        builder.m_cost(19 * 1024); // 19 MiB
        builder.t_cost(2);
        builder.p_cost(1);
        let params = builder.build().map_err(AuthError::from)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        Ok(Self {
            argon2,
            absent_digest: OnceLock::new(),
        })
    }

    /// Fresh random salt per call, so equal passwords never share a digest.
    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        let mut salt_bytes = [0u8; SALT_LEN];
        rand::rngs::OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|err| AuthError::PasswordHash(format!("entropy unavailable: {err}")))?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(AuthError::from)?;
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(AuthError::from)?
            .to_string();
        Ok(hash)
    }

    /// `Ok(false)` on mismatch; an error only when `encoded` is not a PHC digest.
    pub fn verify_password(&self, password: &str, encoded: &str) -> AuthResult<bool> {
        let parsed = PasswordHash::new(encoded)?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(AuthError::from(err)),
        }
    }

    /// Runs a full verification for an email with no account, so the miss costs the
    /// same as a wrong password. Always `Ok(false)`.
    pub fn verify_absent(&self, password: &str) -> AuthResult<bool> {
        let digest = match self.absent_digest.get() {
            Some(digest) => digest,
            None => {
                let digest = self.hash_password(ABSENT_ACCOUNT_PASSWORD)?;
                self.absent_digest.get_or_init(|| digest)
            }
        };
        self.verify_password(password, digest)?;
        Ok(false)
    }
}
