use chrono::Utc;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{catch, get, post, Request, State};
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;

use crate::auth::guards::{AuthOutcome, AuthUser, BearerToken, RequireAdmin};
use crate::auth::responses::{
    LoginRequest, LoginResponse, MessageResponse, RegisterRequest, SessionResponse, SweepResponse,
};
use crate::auth::{service, AuthError, AuthState};

type ErrorResponse = status::Custom<Json<AuthErrorResponse>>;
type AuthRouteResult<T> = Result<Json<T>, ErrorResponse>;

#[derive(Debug, serde::Serialize, serde::Deserialize, JsonSchema)]
pub struct AuthErrorResponse {
    pub status: u16,
    pub message: String,
}

#[openapi(tag = "Auth")]
#[post("/register", data = "<payload>")]
pub async fn register(
    state: &State<AuthState>,
    payload: Json<RegisterRequest>,
) -> Result<status::Custom<Json<MessageResponse>>, ErrorResponse> {
    service::register(state, &payload)
        .await
        .map_err(respond_error)?;

    Ok(status::Custom(
        Status::Created,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

#[openapi(tag = "Auth")]
#[post("/login", data = "<payload>")]
pub async fn login(
    state: &State<AuthState>,
    payload: Json<LoginRequest>,
) -> AuthRouteResult<LoginResponse> {
    let response = service::login(state, &payload)
        .await
        .map_err(respond_error)?;
    Ok(Json(response))
}

#[openapi(tag = "Auth")]
#[post("/api/logout")]
pub async fn logout(
    state: &State<AuthState>,
    authorization: BearerToken,
) -> AuthRouteResult<MessageResponse> {
    service::logout(state, authorization.0.as_deref())
        .await
        .map_err(respond_error)?;
    Ok(Json(MessageResponse::new("Successfully logged out")))
}

#[openapi(tag = "Auth")]
#[get("/api/me")]
pub async fn me(user: AuthUser) -> Json<SessionResponse> {
    let context = user.0;
    Json(SessionResponse {
        email: context.email,
        name: context.name,
        role: context.role,
        expires_at: context.expires_at,
    })
}

#[openapi(tag = "Admin")]
#[post("/api/admin/revocations/sweep")]
pub async fn sweep_revocations(
    state: &State<AuthState>,
    admin: RequireAdmin,
) -> AuthRouteResult<SweepResponse> {
    let deleted = service::sweep_expired_revocations(state.store.as_ref(), Utc::now())
        .await
        .map_err(respond_error)?;
    log::info!("{} swept {} expired revocations", admin.0.email, deleted);
    Ok(Json(SweepResponse { deleted }))
}

#[catch(401)]
pub fn unauthorized(request: &Request<'_>) -> ErrorResponse {
    let message = match AuthOutcome::peek(request) {
        AuthOutcome::Rejected(rejection) => rejection.message.clone(),
        _ => AuthError::MissingCredential.client_message(),
    };
    respond_message(Status::Unauthorized, message)
}

#[catch(403)]
pub fn forbidden(_request: &Request<'_>) -> ErrorResponse {
    respond_message(Status::Forbidden, AuthError::Forbidden.client_message())
}

#[catch(default)]
pub fn default_catcher(status: Status, _request: &Request<'_>) -> ErrorResponse {
    let message = match status.code {
        400 | 422 => "Invalid request body",
        500..=599 => "Internal server error",
        _ => status.reason().unwrap_or("Request failed"),
    };
    respond_message(status, message)
}

fn respond_error(err: AuthError) -> ErrorResponse {
    let status = err.status();
    if status == Status::InternalServerError {
        log::error!("request failed: {}", err);
    }
    respond_message(status, err.client_message())
}

fn respond_message(status: Status, message: impl Into<String>) -> ErrorResponse {
    status::Custom(
        status,
        Json(AuthErrorResponse {
            status: status.code,
            message: message.into(),
        }),
    )
}
