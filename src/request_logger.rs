use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Data, Request, Response};
use std::time::Instant;

use crate::auth::guards::AuthOutcome;

/// Fairing that writes one access-log line per request, including who made it.
pub struct RequestLogger;

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request Logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        request.local_cache(Instant::now);
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let elapsed = request.local_cache(Instant::now).elapsed();

        // Never log the bearer token itself.
        let principal = match AuthOutcome::peek(request) {
            AuthOutcome::Authenticated(context) => {
                format!("{} ({})", context.email, context.role.as_str())
            }
            AuthOutcome::Rejected(rejection) => format!("rejected: {}", rejection.message),
            AuthOutcome::NotAttempted => "-".to_string(),
        };

        log::info!(
            "{} {} -> {} ({:.2}ms) principal={}",
            request.method(),
            request.uri(),
            response.status().code,
            elapsed.as_secs_f64() * 1000.0,
            principal
        );
    }
}
