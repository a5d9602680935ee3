//! End-to-end session behaviour against a mock backend
//!
//! The auth routes and protected routes are served by wiremock; tokens are
//! persisted into an in-memory keychain shared across service instances.

mod support;

use std::time::Duration;

use futures::future::join_all;
use rollcall_common::auth::SessionEvent;
use rollcall_common::testing::MockKeychainProvider;
use rollcall_domain::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use rollcall_domain::ClockInRequest;
use rollcall_infra::ApiError;
use serde_json::json;
use support::{drain, mount_login, mount_refresh, service_for, token_body, NoAuthorization};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn user_body() -> serde_json::Value {
    json!({ "id": "u1", "email": "user@example.com", "name": "Ana" })
}

#[tokio::test]
async fn invalid_login_never_reaches_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("A1", "R1")))
        .expect(0)
        .mount(&server)
        .await;

    let keychain = MockKeychainProvider::new();
    let service = service_for(&server, &keychain);

    assert!(!service.login("", "secret").await);
    assert!(!service.login("user@example.com", "").await);
    assert!(!service.login("user.example.com", "secret").await);
    assert!(!service.is_authenticated());
    assert!(keychain.is_empty());
}

#[tokio::test]
async fn rejected_login_leaves_no_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    let keychain = MockKeychainProvider::new();
    let service = service_for(&server, &keychain);

    assert!(!service.login("user@example.com", "wrong").await);
    assert!(keychain.is_empty());
    assert!(service.current_access_token().is_none());
}

#[tokio::test]
async fn login_survives_restart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "user@example.com", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("A1", "R1")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_body()))
        .mount(&server)
        .await;

    let keychain = MockKeychainProvider::new();
    assert!(service_for(&server, &keychain).login("  user@example.com ", "secret").await);

    let restarted = service_for(&server, &keychain);
    assert!(restarted.bootstrap().await);

    let user = restarted.current_user().await.unwrap();
    assert_eq!(user.display_name(), "Ana");
}

#[tokio::test]
async fn bootstrap_with_empty_keychain_stays_signed_out() {
    let server = MockServer::start().await;
    let service = service_for(&server, &MockKeychainProvider::new());

    assert!(!service.bootstrap().await);
    assert!(!service.snapshot().authenticated);
}

#[tokio::test]
async fn logout_stops_sending_bearer() {
    let server = MockServer::start().await;
    mount_login(&server, "A1", "R1").await;
    mount_refresh(
        &server,
        ResponseTemplate::new(200).set_body_json(token_body("A2", "R2")),
        Duration::ZERO,
        0,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .and(NoAuthorization)
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let keychain = MockKeychainProvider::new();
    let service = service_for(&server, &keychain);
    assert!(service.login("user@example.com", "secret").await);
    let mut events = service.subscribe();

    service.logout().await;

    assert!(keychain.is_empty());
    assert_eq!(drain(&mut events), vec![SessionEvent::SignedOut]);
    assert_eq!(service.current_user().await.unwrap_err(), ApiError::SessionExpired);
}

#[tokio::test]
async fn concurrent_expired_requests_share_one_refresh() {
    let server = MockServer::start().await;
    mount_login(&server, "A1", "R1").await;
    mount_refresh(
        &server,
        ResponseTemplate::new(200).set_body_json(token_body("A2", "R2")),
        Duration::from_millis(200),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_body()))
        .expect(5)
        .mount(&server)
        .await;

    let keychain = MockKeychainProvider::new();
    let service = service_for(&server, &keychain);
    assert!(service.login("user@example.com", "secret").await);
    let mut events = service.subscribe();

    let results = join_all((0..5).map(|_| service.current_user())).await;

    assert!(results.iter().all(Result::is_ok), "all requests should replay: {results:?}");
    assert_eq!(service.refresh_count(), 1);
    assert_eq!(service.current_access_token().as_deref(), Some("A2"));
    assert_eq!(keychain.secret(ACCESS_TOKEN_KEY).as_deref(), Some("A2"));
    assert_eq!(keychain.secret(REFRESH_TOKEN_KEY).as_deref(), Some("R2"));
    assert_eq!(drain(&mut events), vec![SessionEvent::Refreshed]);
}

#[tokio::test]
async fn failed_refresh_ends_session_once() {
    let server = MockServer::start().await;
    mount_login(&server, "A1", "R1").await;
    mount_refresh(
        &server,
        ResponseTemplate::new(401).set_body_json(json!({ "message": "refresh token revoked" })),
        Duration::from_millis(200),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let keychain = MockKeychainProvider::new();
    let service = service_for(&server, &keychain);
    assert!(service.login("user@example.com", "secret").await);
    let mut events = service.subscribe();

    let results = join_all((0..5).map(|_| service.current_user())).await;

    for result in results {
        assert_eq!(result.unwrap_err(), ApiError::SessionExpired);
    }
    assert!(keychain.is_empty());
    assert!(!service.is_authenticated());

    let invalidations = drain(&mut events)
        .into_iter()
        .filter(|event| matches!(event, SessionEvent::Invalidated { .. }))
        .count();
    assert_eq!(invalidations, 1);
}

#[tokio::test]
async fn server_error_is_not_retried() {
    let server = MockServer::start().await;
    mount_login(&server, "A1", "R1").await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server, &MockKeychainProvider::new());
    assert!(service.login("user@example.com", "secret").await);

    let err = service.current_user().await.unwrap_err();

    assert!(matches!(err, ApiError::Server(_)));
    assert!(service.is_authenticated());
    assert_eq!(service.refresh_count(), 0);
}

#[tokio::test]
async fn signup_validates_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "u2" })))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server, &MockKeychainProvider::new());

    assert!(!service.signup("new@example.com", "12345", "12345").await);
    assert!(!service.signup("new@example.com", "123456", "1234567").await);
    assert_eq!(
        service.try_signup("new@example.com", "123456", "123456").await.unwrap(),
        json!({ "id": "u2" })
    );
    assert!(!service.is_authenticated());
}

#[tokio::test]
async fn attendance_calls_ride_the_session() {
    let server = MockServer::start().await;
    mount_login(&server, "A1", "R1").await;
    Mock::given(method("GET"))
        .and(path("/api/attendance/hasInTimeToday"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hasInTime": false })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/attendance/inlog"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": true })))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server, &MockKeychainProvider::new());
    assert!(service.login("user@example.com", "secret").await);
    let attendance = service.attendance();

    assert!(!attendance.has_in_time_today().await.unwrap());
    let ack = attendance.clock_in(&ClockInRequest::matched(12.9, 77.6, 0.88)).await.unwrap();
    assert!(ack.status);
}
