use chrono::{Duration, Utc};
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use serde_json::json;

use ticket_api::auth::responses::{LoginResponse, MessageResponse, Role, SessionResponse, SweepResponse};
use ticket_api::auth::routes::AuthErrorResponse;
use ticket_api::auth::store::{CredentialStore, NewIdentity, RevocationEntry};
use ticket_api::auth::{AuthState, MemoryCredentialStore};
use ticket_api::test_support::{memory_auth_state, TestRocketBuilder};

async fn client_with_store() -> (Client, AuthState, MemoryCredentialStore) {
    let (state, store) = memory_auth_state();
    let client = TestRocketBuilder::new()
        .mount_app_routes()
        .manage_auth_state(state.clone())
        .async_client()
        .await;
    (client, state, store)
}

async fn register(client: &Client, name: &str, email: &str, password: &str) -> Status {
    client
        .post("/register")
        .header(ContentType::JSON)
        .body(json!({ "name": name, "email": email, "password": password }).to_string())
        .dispatch()
        .await
        .status()
}

async fn login(client: &Client, email: &str, password: &str) -> LoginResponse {
    let response = client
        .post("/login")
        .header(ContentType::JSON)
        .body(json!({ "email": email, "password": password }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    response.into_json().await.expect("login payload")
}

async fn seed_admin(state: &AuthState, email: &str, password: &str) {
    let password_hash = state
        .password_service
        .hash_password(password)
        .expect("hash admin password");
    state
        .store
        .insert_identity(NewIdentity {
            name: "Box Office".into(),
            email: email.into(),
            password_hash,
            role: Role::Admin,
        })
        .await
        .expect("insert admin");
}

fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {token}"))
}

#[tokio::test]
async fn register_then_duplicate_is_conflict() {
    let (client, _state, _store) = client_with_store().await;

    let response = client
        .post("/register")
        .header(ContentType::JSON)
        .body(json!({ "name": "Ana", "email": "ana@example.com", "password": "secret1" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);
    let body: MessageResponse = response.into_json().await.expect("message body");
    assert_eq!(body.message, "User registered successfully");

    let response = client
        .post("/register")
        .header(ContentType::JSON)
        .body(json!({ "name": "Ana", "email": "ANA@example.com", "password": "secret1" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);
    let body: AuthErrorResponse = response.into_json().await.expect("error body");
    assert_eq!(body.status, 409);
    assert_eq!(body.message, "Email already registered");
}

#[tokio::test]
async fn register_rejects_invalid_fields() {
    let (client, _state, _store) = client_with_store().await;

    assert_eq!(
        register(&client, "Ana", "not-an-email", "secret1").await,
        Status::BadRequest
    );
    assert_eq!(
        register(&client, "Ana", "ana@example.com", "short").await,
        Status::BadRequest
    );
    assert_eq!(
        register(&client, "", "ana@example.com", "secret1").await,
        Status::BadRequest
    );
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let (client, _state, _store) = client_with_store().await;

    let response = client
        .post("/register")
        .header(ContentType::JSON)
        .body("{not json")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    let body: AuthErrorResponse = response.into_json().await.expect("error body");
    assert_eq!(body.message, "Invalid request body");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let (client, _state, _store) = client_with_store().await;
    assert_eq!(
        register(&client, "Ana", "ana@example.com", "secret1").await,
        Status::Created
    );

    let wrong_password = client
        .post("/login")
        .header(ContentType::JSON)
        .body(json!({ "email": "ana@example.com", "password": "wrong-pass" }).to_string())
        .dispatch()
        .await;
    assert_eq!(wrong_password.status(), Status::Unauthorized);
    let wrong_password = wrong_password.into_string().await.expect("body");

    let unknown_email = client
        .post("/login")
        .header(ContentType::JSON)
        .body(json!({ "email": "nobody@example.com", "password": "secret1" }).to_string())
        .dispatch()
        .await;
    assert_eq!(unknown_email.status(), Status::Unauthorized);
    let unknown_email = unknown_email.into_string().await.expect("body");

    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn login_then_me_reports_identity() {
    let (client, _state, _store) = client_with_store().await;
    register(&client, "Ana", "ana@example.com", "secret1").await;

    let session = login(&client, "Ana@Example.com", "secret1").await;
    assert_eq!(session.user.email, "ana@example.com");
    assert_eq!(session.user.role, Role::User);
    assert_eq!(session.token.split('.').count(), 3);

    let response = client
        .get("/api/me")
        .header(bearer(&session.token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let me: SessionResponse = response.into_json().await.expect("session body");
    assert_eq!(me.email, "ana@example.com");
    assert_eq!(me.name, "Ana");
    assert_eq!(me.role, Role::User);
    assert!(me.expires_at > Utc::now() + Duration::hours(23));
}

#[tokio::test]
async fn protected_route_rejects_missing_and_malformed_headers() {
    let (client, _state, _store) = client_with_store().await;

    let response = client.get("/api/me").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
    let body: AuthErrorResponse = response.into_json().await.expect("error body");
    assert_eq!(body.message, "Authorization header required");

    for value in ["Token abc", "Bearer", "Bearer a b", "bearer abc"] {
        let response = client
            .get("/api/me")
            .header(Header::new("Authorization", value))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized, "{value}");
        let body: AuthErrorResponse = response.into_json().await.expect("error body");
        assert_eq!(body.message, "Invalid authorization format", "{value}");
    }

    let response = client
        .get("/api/me")
        .header(bearer("not.a.token"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
}

#[tokio::test]
async fn logout_invalidates_token() {
    let (client, _state, store) = client_with_store().await;
    register(&client, "Ana", "ana@example.com", "secret1").await;
    let session = login(&client, "ana@example.com", "secret1").await;

    let response = client
        .post("/api/logout")
        .header(bearer(&session.token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: MessageResponse = response.into_json().await.expect("message body");
    assert_eq!(body.message, "Successfully logged out");
    assert_eq!(store.revocation_count(), 1);

    let response = client
        .get("/api/me")
        .header(bearer(&session.token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
    let body: AuthErrorResponse = response.into_json().await.expect("error body");
    assert_eq!(body.message, "Token has been invalidated");

    let again = client
        .post("/api/logout")
        .header(bearer(&session.token))
        .dispatch()
        .await;
    assert_eq!(again.status(), Status::Ok);
    assert_eq!(store.revocation_count(), 1);
}

#[tokio::test]
async fn logout_with_expired_token_writes_nothing() {
    let (client, state, store) = client_with_store().await;
    register(&client, "Ana", "ana@example.com", "secret1").await;

    let identity = state
        .store
        .find_by_email("ana@example.com")
        .await
        .expect("lookup")
        .expect("registered identity");
    let stale = state
        .token_service
        .issue_at(&identity, Utc::now() - Duration::hours(48))
        .expect("issue stale token");

    let response = client
        .post("/api/logout")
        .header(bearer(&stale.token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
    assert_eq!(store.revocation_count(), 0);

    let response = client.post("/api/logout").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
    let body: AuthErrorResponse = response.into_json().await.expect("error body");
    assert_eq!(body.message, "Authorization header required");
}

#[tokio::test]
async fn admin_route_distinguishes_unauthenticated_from_forbidden() {
    let (client, state, _store) = client_with_store().await;
    register(&client, "Ana", "ana@example.com", "secret1").await;
    let user = login(&client, "ana@example.com", "secret1").await;

    let response = client.post("/api/admin/revocations/sweep").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
    let body: AuthErrorResponse = response.into_json().await.expect("error body");
    assert_eq!(body.message, "Authorization header required");

    let response = client
        .post("/api/admin/revocations/sweep")
        .header(bearer(&user.token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);
    let body: AuthErrorResponse = response.into_json().await.expect("error body");
    assert_eq!(body.message, "Admin access required");

    seed_admin(&state, "admin@example.com", "admin-pass").await;
    let admin = login(&client, "admin@example.com", "admin-pass").await;
    assert_eq!(admin.user.role, Role::Admin);

    state
        .store
        .insert_revocation(RevocationEntry {
            token: "stale-token".into(),
            email: "ana@example.com".into(),
            expires_at: Utc::now() - Duration::hours(1),
            created_at: Utc::now() - Duration::hours(25),
        })
        .await
        .expect("insert stale entry");

    let response = client
        .post("/api/admin/revocations/sweep")
        .header(bearer(&admin.token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: SweepResponse = response.into_json().await.expect("sweep body");
    assert_eq!(body.deleted, 1);
}

#[tokio::test]
async fn revoked_admin_token_is_unauthorized_not_forbidden() {
    let (client, state, _store) = client_with_store().await;
    seed_admin(&state, "admin@example.com", "admin-pass").await;
    let admin = login(&client, "admin@example.com", "admin-pass").await;

    let response = client
        .post("/api/logout")
        .header(bearer(&admin.token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let response = client
        .post("/api/admin/revocations/sweep")
        .header(bearer(&admin.token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
    let body: AuthErrorResponse = response.into_json().await.expect("error body");
    assert_eq!(body.message, "Token has been invalidated");
}
