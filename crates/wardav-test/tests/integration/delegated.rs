#![allow(clippy::expect_used)]
//! Delegated auth through the HTTP gate.
//!
//! Areas live under `/dav/{user_dir}`. The identity service is mocked with
//! wiremock; each test owns its own mock server.

use std::sync::Arc;

use salvo::http::StatusCode;
use serde_json::json;
use wardav_core::constants::HEALTHCHECK_ROUTE;
use wardav_service::identity::SystemClock;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::helpers::*;

fn service(server: &MockServer) -> salvo::Service {
    delegated_service(&server.uri(), Arc::new(SystemClock)).expect("valid service")
}

// ============================================================================
// Area scenarios
// ============================================================================

/// Alice works inside her own area and is refused in Bob's.
#[test_log::test(tokio::test)]
async fn owner_reads_own_area_but_not_others() {
    let server = MockServer::start().await;
    mount_identity(&server, "alice", "pw", principal("alice", "alice/media", false), 1).await;
    let service = service(&server);

    TestRequest::get("/dav/alice/media/file.txt")
        .basic_auth("alice", "pw")
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .assert_body("alice");

    TestRequest::get("/dav/bob/media/file.txt")
        .basic_auth("alice", "pw")
        .send(&service)
        .await
        .assert_status(StatusCode::FORBIDDEN)
        .assert_no_header("www-authenticate");
}

/// A superuser may open another area's root, but nothing below it.
#[test_log::test(tokio::test)]
async fn superuser_reaches_sibling_area_root() {
    let server = MockServer::start().await;
    mount_identity(&server, "admin", "pw", principal("admin", "admin/media", true), 1).await;
    let service = service(&server);

    TestRequest::propfind("/dav/bob/media")
        .basic_auth("admin", "pw")
        .send(&service)
        .await
        .assert_status(StatusCode::OK);

    TestRequest::get("/dav/bob/media/secret.txt")
        .basic_auth("admin", "pw")
        .send(&service)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

/// A regular user hitting another area's root is asked to log in again.
#[test_log::test(tokio::test)]
async fn foreign_area_root_prompts_again() {
    let server = MockServer::start().await;
    mount_identity(&server, "bob", "pw", principal("bob", "bob/media", false), 1).await;
    let service = service(&server);

    assert_challenge(
        TestRequest::get("/dav/carol/media")
            .basic_auth("bob", "pw")
            .send(&service)
            .await,
    );
}

#[test_log::test(tokio::test)]
async fn mkcol_is_forbidden_even_for_superusers() {
    let server = MockServer::start().await;
    mount_identity(&server, "admin", "pw", principal("admin", "admin/media", true), 1).await;
    let service = service(&server);

    TestRequest::mkcol("/dav/admin/media/new")
        .basic_auth("admin", "pw")
        .send(&service)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[test_log::test(tokio::test)]
async fn move_and_copy_follow_destination() {
    let server = MockServer::start().await;
    mount_identity(&server, "alice", "pw", principal("alice", "alice/media", false), 1).await;
    let service = service(&server);

    TestRequest::r#move("/dav/alice/media/a.txt")
        .basic_auth("alice", "pw")
        .destination("http://127.0.0.1:5800/dav/alice/media/b.txt")
        .send(&service)
        .await
        .assert_status(StatusCode::OK);

    TestRequest::copy("/dav/alice/media/a.txt")
        .basic_auth("alice", "pw")
        .destination("http://127.0.0.1:5800/dav/bob/media/a.txt")
        .send(&service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    TestRequest::r#move("/dav/alice/media/a.txt")
        .basic_auth("alice", "pw")
        .send(&service)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[test_log::test(tokio::test)]
async fn traversal_cannot_leave_the_area() {
    let server = MockServer::start().await;
    mount_identity(&server, "alice", "pw", principal("alice", "alice/media", false), 1).await;
    let service = service(&server);

    TestRequest::get("/dav/alice/media/%2e%2e/%2e%2e/bob/media/x")
        .basic_auth("alice", "pw")
        .send(&service)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

// ============================================================================
// Credential handling
// ============================================================================

#[test_log::test(tokio::test)]
async fn missing_credentials_get_a_challenge() {
    let server = MockServer::start().await;
    let service = service(&server);

    assert_challenge(TestRequest::get("/dav/alice/media").send(&service).await);
    assert_challenge(
        TestRequest::get("/dav/alice/media")
            .header("Authorization", "Bearer token")
            .send(&service)
            .await,
    );
    assert!(
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .is_empty()
    );
}

#[test_log::test(tokio::test)]
async fn rejected_credentials_get_a_challenge() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/auth"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .expect(1)
        .mount(&server)
        .await;
    let service = service(&server);

    assert_challenge(
        TestRequest::get("/dav/alice/media")
            .basic_auth("alice", "wrong")
            .send(&service)
            .await,
    );
}

/// The identity service vouching for someone else must not let Alice in.
#[test_log::test(tokio::test)]
async fn principal_for_another_user_is_rejected() {
    let server = MockServer::start().await;
    mount_identity(&server, "alice", "pw", principal("mallory", "alice/media", false), 1).await;
    let service = service(&server);

    assert_challenge(
        TestRequest::get("/dav/alice/media/file.txt")
            .basic_auth("alice", "pw")
            .send(&service)
            .await,
    );
}

#[test_log::test(tokio::test)]
async fn principal_without_user_dir_is_forbidden() {
    let server = MockServer::start().await;
    mount_identity(&server, "alice", "pw", json!({"username": "alice"}), 1).await;
    let service = service(&server);

    TestRequest::get("/dav/alice/media/file.txt")
        .basic_auth("alice", "pw")
        .send(&service)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[test_log::test(tokio::test)]
async fn healthcheck_bypasses_the_gate() {
    let server = MockServer::start().await;
    let service = service(&server);

    TestRequest::get(HEALTHCHECK_ROUTE)
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .assert_body("OK");
}
