use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use sea_orm::DatabaseConnection;
use serde_json::Value;

use tracker_api::crypto::derive_key;
use tracker_api::router::build_router;
use tracker_api::state::AppState;
use tracker_core::middleware::REQUEST_ID_HEADER;
use tracker_testing::auth::{MockSession, two_factor_cookie};
use tracker_testing::json::assert_error_kind;

use crate::helpers::{TEST_AUTH_SECRET, test_webauthn};

/// Router over a disconnected database. The redis pool connects lazily and
/// is never touched by these requests.
fn server() -> TestServer {
    let redis = deadpool_redis::Config::from_url("redis://127.0.0.1:6379")
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .unwrap();
    let state = AppState {
        db: DatabaseConnection::Disconnected,
        redis,
        webauthn: test_webauthn(),
        auth_secret: TEST_AUTH_SECRET.to_owned(),
        encryption_key: derive_key(TEST_AUTH_SECRET),
        cookie_domain: "localhost".to_owned(),
        app_name: "Tracker".to_owned(),
    };
    TestServer::new(build_router(state)).unwrap()
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_report_liveness() {
    let response = server().get("/healthz").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn should_report_not_ready_without_database() {
    let response = server().get("/readyz").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

// ── Authentication ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_protected_routes_without_session() {
    let server = server();

    for path in ["/api/auth/get-session", "/api/user/me", "/api/user/workspaces"] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_error_kind(&response.json::<Value>(), "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn should_surface_store_failure_as_internal_error() {
    let (name, value) = MockSession::random().bearer_header();

    let response = server().get("/api/user/me").add_header(name, value).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_error_kind(&response.json::<Value>(), "INTERNAL");
}

#[tokio::test]
async fn should_reject_second_factor_without_valid_ticket() {
    let server = server();
    let body = serde_json::json!({ "code": "AAAAA-BBBBB" });

    let missing = server
        .post("/api/auth/two-factor/verify-backup-code")
        .json(&body)
        .await;
    let (name, value) = two_factor_cookie("not-a-jwt");
    let forged = server
        .post("/api/auth/two-factor/verify-backup-code")
        .add_header(name, value)
        .json(&body)
        .await;

    for response in [missing, forged] {
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_error_kind(&response.json::<Value>(), "INVALID_TWO_FACTOR_TICKET");
    }
}

// ── Request bodies ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_render_body_rejections_as_validation_errors() {
    let server = server();

    let missing_field = server
        .post("/api/auth/sign-up/email")
        .json(&serde_json::json!({
            "email": "ada@example.com",
            "password": "correct horse battery",
        }))
        .await;
    let wrong_type = server
        .post("/api/auth/sign-up/email")
        .json(&serde_json::json!({
            "name": "Ada",
            "email": 5,
            "password": "correct horse battery",
        }))
        .await;
    let not_json = server
        .post("/api/auth/sign-up/email")
        .text("name=Ada")
        .await;

    for response in [missing_field, wrong_type, not_json] {
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_error_kind(&response.json::<Value>(), "VALIDATION");
    }
}

// ── Request id ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_assign_request_id_when_missing() {
    let response = server().get("/healthz").await;

    let id = response.header(REQUEST_ID_HEADER);
    let id = id.to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok(), "got {id}");
}

#[tokio::test]
async fn should_echo_incoming_request_id() {
    let response = server()
        .get("/healthz")
        .add_header(
            HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderValue::from_static("req-1234"),
        )
        .await;

    assert_eq!(response.header(REQUEST_ID_HEADER), "req-1234");
}
