//! Liveness endpoint used by load balancers and smoke tests.

use rocket::get;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::auth::responses::MessageResponse;

/// Returns `{"message": "pong"}` without touching storage.
#[openapi(tag = "Health")]
#[get("/ping")]
pub fn ping() -> Json<MessageResponse> {
    Json(MessageResponse::new("pong"))
}
