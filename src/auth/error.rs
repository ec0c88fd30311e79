use rocket::http::Status;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Authorization header required")]
    MissingCredential,
    #[error("Invalid authorization format")]
    MalformedHeader,
    #[error("Token has been invalidated")]
    RevokedCredential,
    #[error("Malformed token")]
    MalformedCredential,
    #[error("Invalid token signature")]
    InvalidSignature,
    #[error("Token expired")]
    CredentialExpired,
    #[error("Invalid token claims")]
    InvalidClaims,
    #[error("Admin access required")]
    Forbidden,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("argon2 parameter error: {0}")]
    Argon2(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
    #[error("unexpected error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status(&self) -> Status {
        match self {
            AuthError::Validation(_) => Status::BadRequest,
            AuthError::DuplicateEmail => Status::Conflict,
            AuthError::InvalidCredentials
            | AuthError::MissingCredential
            | AuthError::MalformedHeader
            | AuthError::RevokedCredential
            | AuthError::MalformedCredential
            | AuthError::InvalidSignature
            | AuthError::CredentialExpired
            | AuthError::InvalidClaims => Status::Unauthorized,
            AuthError::Forbidden => Status::Forbidden,
            AuthError::Config(_)
            | AuthError::Sqlx(_)
            | AuthError::Jwt(_)
            | AuthError::Argon2(_)
            | AuthError::PasswordHash(_)
            | AuthError::Internal(_) => Status::InternalServerError,
        }
    }

    /// True for the failures a bearer credential check can produce.
    pub fn is_credential_rejection(&self) -> bool {
        self.status() == Status::Unauthorized && !matches!(self, AuthError::InvalidCredentials)
    }

    /// Message safe to hand back to the caller. Server-side failures collapse to a
    /// generic text so storage and hashing details never leave the process.
    pub fn client_message(&self) -> String {
        if self.status() == Status::InternalServerError {
            INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<argon2::Error> for AuthError {
    fn from(err: argon2::Error) -> Self {
        AuthError::Argon2(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthError::PasswordHash(err.to_string())
    }
}
