use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use crate::auth::responses::Role;
use crate::auth::store::Identity;
use crate::auth::{AuthConfig, AuthError, AuthResult};

const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Wire claims of a bearer credential. Time fields are Unix-epoch seconds.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AccessTokenClaims {
    pub email: String,
    pub name: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
}

/// Claims after verification, with the role checked against the closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SignedAccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Stateless issuer and verifier over one process-wide HMAC secret.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

impl TokenService {
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        if config.jwt_secret.is_empty() {
            return Err(AuthError::Config("signing secret must not be empty".into()));
        }
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&config.token_ttl_secs) {
            return Err(AuthError::Config(format!(
                "token ttl must be between 1 and {MAX_TOKEN_TTL_SECS} seconds"
            )));
        }
        let token_ttl = Duration::try_seconds(config.token_ttl_secs)
            .ok_or_else(|| AuthError::Config("token ttl out of range".into()))?;

        let secret_bytes = config.jwt_secret.as_bytes();
        let encoding_key = EncodingKey::from_secret(secret_bytes);
        let decoding_key = DecodingKey::from_secret(secret_bytes);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.set_required_spec_claims(&["exp", "nbf"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = 0;

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            token_ttl,
        })
    }

    pub fn issue(&self, identity: &Identity) -> AuthResult<SignedAccessToken> {
        self.issue_at(identity, Utc::now())
    }

    /// Issues a credential as if the clock read `now`.
    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> AuthResult<SignedAccessToken> {
        let expires_at = now
            .checked_add_signed(self.token_ttl)
            .ok_or_else(|| AuthError::Internal("token expiry out of range".into()))?;

        let claims = AccessTokenClaims {
            email: identity.email.clone(),
            name: identity.name.clone(),
            role: identity.role.as_str().to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(SignedAccessToken { token, expires_at })
    }

    /// Checks structure, signature and validity window. Revocation is not consulted.
    pub fn verify(&self, token: &str) -> AuthResult<VerifiedClaims> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedCredential)?;
        if !HMAC_ALGORITHMS.contains(&header.alg) {
            return Err(AuthError::MalformedCredential);
        }

        let token_data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| classify(err.kind()))?;
        let claims = token_data.claims;

        let role = Role::parse(&claims.role).ok_or(AuthError::InvalidClaims)?;
        let issued_at = timestamp(claims.iat)?;
        let expires_at = timestamp(claims.exp)?;
        if claims.email.is_empty() || expires_at < issued_at {
            return Err(AuthError::InvalidClaims);
        }

        Ok(VerifiedClaims {
            email: claims.email,
            name: claims.name,
            role,
            issued_at,
            expires_at,
        })
    }
}

fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::InvalidAlgorithm => {
            AuthError::MalformedCredential
        }
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => AuthError::CredentialExpired,
        _ => AuthError::InvalidClaims,
    }
}

fn timestamp(secs: i64) -> AuthResult<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or(AuthError::InvalidClaims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_JWT_SECRET: &str = "super-secret-test-key";

    fn service(secret: &str) -> TokenService {
        TokenService::from_config(&AuthConfig::with_secret(secret)).expect("jwt service")
    }

    fn identity(role: Role) -> Identity {
        let now = Utc::now();
        Identity {
            id: 7,
            name: "A".into(),
            email: "a@x.com".into(),
            password_hash: String::new(),
            role,
            created_at: now,
            updated_at: now,
            last_login_at: None,
            deleted_at: None,
        }
    }

    #[test]
    fn issues_and_verifies_access_tokens() {
        let service = service(TEST_JWT_SECRET);
        let token = service.issue(&identity(Role::Admin)).expect("issue token");

        let claims = service.verify(&token.token).expect("verify token");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.name, "A");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.expires_at.timestamp(), token.expires_at.timestamp());
        assert_eq!(claims.expires_at - claims.issued_at, Duration::hours(24));
    }

    #[test]
    fn token_has_three_segments() {
        let token = service(TEST_JWT_SECRET)
            .issue(&identity(Role::User))
            .expect("issue token");
        assert_eq!(token.token.split('.').count(), 3);
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = service(TEST_JWT_SECRET);
        let issued = Utc::now() - Duration::hours(25);
        let token = service
            .issue_at(&identity(Role::User), issued)
            .expect("issue token");

        let err = service.verify(&token.token).unwrap_err();
        assert!(matches!(err, AuthError::CredentialExpired), "{err:?}");
    }

    #[test]
    fn not_yet_valid_token_is_rejected() {
        let service = service(TEST_JWT_SECRET);
        let issued = Utc::now() + Duration::hours(1);
        let token = service
            .issue_at(&identity(Role::User), issued)
            .expect("issue token");

        let err = service.verify(&token.token).unwrap_err();
        assert!(matches!(err, AuthError::CredentialExpired), "{err:?}");
    }

    #[test]
    fn foreign_secret_fails_signature_check() {
        let token = service("another-secret")
            .issue(&identity(Role::User))
            .expect("issue token");

        let err = service(TEST_JWT_SECRET).verify(&token.token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature), "{err:?}");
    }

    #[test]
    fn garbage_is_malformed() {
        let service = service(TEST_JWT_SECRET);
        for raw in ["", "abc", "a.b", "not.a.token"] {
            let err = service.verify(raw).unwrap_err();
            assert!(matches!(err, AuthError::MalformedCredential), "{raw}: {err:?}");
        }
    }

    #[test]
    fn foreign_algorithm_is_malformed() {
        let token = service(TEST_JWT_SECRET)
            .issue(&identity(Role::User))
            .expect("issue token");
        let (_, rest) = token.token.split_once('.').expect("header segment");

        // {"alg":"RS256","typ":"JWT"}, {"alg":"none","typ":"JWT"}, {"alg":"ES256","typ":"JWT"}
        for header in [
            "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9",
            "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0",
            "eyJhbGciOiJFUzI1NiIsInR5cCI6IkpXVCJ9",
        ] {
            let forged = format!("{header}.{rest}");
            let err = service(TEST_JWT_SECRET).verify(&forged).unwrap_err();
            assert!(matches!(err, AuthError::MalformedCredential), "{header}: {err:?}");
        }
    }

    #[test]
    fn out_of_range_ttl_is_a_config_error() {
        for ttl in [0, -5, MAX_TOKEN_TTL_SECS + 1, i64::MAX] {
            let mut config = AuthConfig::with_secret(TEST_JWT_SECRET);
            config.token_ttl_secs = ttl;
            let err = TokenService::from_config(&config).err().expect("rejected ttl");
            assert!(matches!(err, AuthError::Config(_)), "{ttl}: {err:?}");
        }

        let mut config = AuthConfig::with_secret(TEST_JWT_SECRET);
        config.token_ttl_secs = MAX_TOKEN_TTL_SECS;
        let service = TokenService::from_config(&config).expect("longest ttl accepted");
        service.issue(&identity(Role::User)).expect("issue token");
    }

    #[test]
    fn unknown_role_is_invalid_claims() {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            email: "a@x.com".into(),
            name: "A".into(),
            role: "superuser".into(),
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        )
        .expect("encode");

        let err = service(TEST_JWT_SECRET).verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidClaims), "{err:?}");
    }

    #[test]
    fn missing_claim_is_invalid_claims() {
        let now = Utc::now();
        let claims = serde_json::json!({
            "email": "a@x.com",
            "exp": (now + Duration::hours(1)).timestamp(),
            "nbf": now.timestamp(),
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        )
        .expect("encode");

        let err = service(TEST_JWT_SECRET).verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidClaims), "{err:?}");
    }
}
