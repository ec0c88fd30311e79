use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use rocket_okapi::request::OpenApiFromRequest;

use crate::auth::gateway::{self, AuthContext};
use crate::auth::{AuthError, AuthState};

/// Why a request failed authentication; kept for catchers and the access log.
#[derive(Debug, Clone)]
pub struct Rejection {
    pub status: Status,
    pub message: String,
}

impl From<&AuthError> for Rejection {
    fn from(err: &AuthError) -> Self {
        Self {
            status: err.status(),
            message: err.client_message(),
        }
    }
}

/// Per-request memo of the gateway result, stored in Rocket's request-local cache so
/// stacked guards run the token checks once.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    NotAttempted,
    Authenticated(AuthContext),
    Rejected(Rejection),
}

impl AuthOutcome {
    /// Reads the memo without triggering authentication.
    pub fn peek<'r>(request: &'r Request<'_>) -> &'r AuthOutcome {
        request.local_cache(|| AuthOutcome::NotAttempted)
    }
}

/// Guard for any authenticated route; carries the injected identity.
#[derive(Debug, Clone, OpenApiFromRequest)]
pub struct AuthUser(pub AuthContext);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = Rejection;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let outcome = request
            .local_cache_async(async { authenticate_request(request).await })
            .await;

        match outcome {
            AuthOutcome::Authenticated(context) => Outcome::Success(AuthUser(context.clone())),
            AuthOutcome::Rejected(rejection) => {
                Outcome::Error((rejection.status, rejection.clone()))
            }
            AuthOutcome::NotAttempted => {
                let rejection = Rejection::from(&AuthError::MissingCredential);
                Outcome::Error((rejection.status, rejection))
            }
        }
    }
}

/// Admin Gate. Only inspects the role the gateway injected, so it always runs after
/// `AuthUser` and an unauthenticated request is reported as such, never as forbidden.
#[derive(Debug, Clone, OpenApiFromRequest)]
pub struct RequireAdmin(pub AuthContext);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RequireAdmin {
    type Error = Rejection;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match AuthUser::from_request(request).await {
            Outcome::Success(AuthUser(context)) => match gateway::require_admin(&context) {
                Ok(()) => Outcome::Success(RequireAdmin(context)),
                Err(err) => {
                    log::debug!("admin route refused for {}", context.email);
                    let rejection = Rejection::from(&err);
                    Outcome::Error((rejection.status, rejection))
                }
            },
            Outcome::Error(err) => Outcome::Error(err),
            Outcome::Forward(status) => Outcome::Forward(status),
        }
    }
}

/// Raw `Authorization` header for flows that parse it themselves, such as logout.
#[derive(Debug, Clone, OpenApiFromRequest)]
pub struct BearerToken(pub Option<String>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for BearerToken {
    type Error = std::convert::Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let header = request.headers().get_one("Authorization").map(str::to_string);
        Outcome::Success(BearerToken(header))
    }
}

async fn authenticate_request(request: &Request<'_>) -> AuthOutcome {
    let Some(state) = request.rocket().state::<AuthState>() else {
        let err = AuthError::Config("AuthState missing from managed state".into());
        log::error!("{}", err);
        return AuthOutcome::Rejected(Rejection::from(&err));
    };

    let header = request.headers().get_one("Authorization");
    match gateway::authenticate(state.store.as_ref(), &state.token_service, header).await {
        Ok(context) => AuthOutcome::Authenticated(context),
        Err(err) => {
            if err.is_credential_rejection() {
                log::debug!("request rejected: {:?}", err);
            } else {
                log::error!("authentication failed: {}", err);
            }
            AuthOutcome::Rejected(Rejection::from(&err))
        }
    }
}
