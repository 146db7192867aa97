#![allow(clippy::expect_used)]
//! Identity service failures surface as gateway errors, never as denials.

use std::sync::Arc;

use salvo::http::StatusCode;
use wardav_service::identity::SystemClock;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::helpers::*;

#[test_log::test(tokio::test)]
async fn unreachable_service_is_503() {
    let service =
        delegated_service("http://127.0.0.1:1", Arc::new(SystemClock)).expect("valid service");

    TestRequest::get("/dav/alice/media")
        .basic_auth("alice", "pw")
        .send(&service)
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE)
        .assert_no_header("www-authenticate");
}

#[test_log::test(tokio::test)]
async fn server_error_is_502() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/auth"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    let service = delegated_service(&server.uri(), Arc::new(SystemClock)).expect("valid service");

    TestRequest::get("/dav/alice/media")
        .basic_auth("alice", "pw")
        .send(&service)
        .await
        .assert_status(StatusCode::BAD_GATEWAY);
}

#[test_log::test(tokio::test)]
async fn empty_principal_body_is_502() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ticket"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v0/users/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_string("  \n"))
        .mount(&server)
        .await;
    let service = delegated_service(&server.uri(), Arc::new(SystemClock)).expect("valid service");

    TestRequest::get("/dav/alice/media")
        .basic_auth("alice", "pw")
        .send(&service)
        .await
        .assert_status(StatusCode::BAD_GATEWAY);
}

/// A failed call is not cached: once the service recovers, the next request
/// goes through.
#[test_log::test(tokio::test)]
async fn recovery_is_seen_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/auth"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_identity(&server, "alice", "pw", principal("alice", "alice/media", false), 1).await;
    let service = delegated_service(&server.uri(), Arc::new(SystemClock)).expect("valid service");

    TestRequest::get("/dav/alice/media")
        .basic_auth("alice", "pw")
        .send(&service)
        .await
        .assert_status(StatusCode::BAD_GATEWAY);

    TestRequest::get("/dav/alice/media")
        .basic_auth("alice", "pw")
        .send(&service)
        .await
        .assert_status(StatusCode::OK);
}
