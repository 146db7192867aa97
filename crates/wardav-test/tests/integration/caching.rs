#![allow(clippy::expect_used)]
//! Identity calls are memoized per time bucket.

use std::sync::Arc;

use salvo::http::StatusCode;
use wardav_service::identity::ManualClock;
use wiremock::MockServer;

use super::helpers::*;

#[test_log::test(tokio::test)]
async fn repeated_requests_share_one_handshake() {
    let server = MockServer::start().await;
    mount_identity(&server, "alice", "pw", principal("alice", "alice/media", false), 1).await;
    let clock = Arc::new(ManualClock::new(3_000));
    let service = delegated_service(&server.uri(), clock.clone()).expect("valid service");

    for path in [
        "/dav/alice/media",
        "/dav/alice/media/a.txt",
        "/dav/alice/media/b.txt",
    ] {
        TestRequest::propfind(path)
            .basic_auth("alice", "pw")
            .send(&service)
            .await
            .assert_status(StatusCode::OK);
        clock.advance(5);
    }
}

#[test_log::test(tokio::test)]
async fn new_bucket_triggers_new_handshake() {
    let server = MockServer::start().await;
    mount_identity(&server, "alice", "pw", principal("alice", "alice/media", false), 2).await;
    let clock = Arc::new(ManualClock::new(3_000));
    let service = delegated_service(&server.uri(), clock.clone()).expect("valid service");

    for _ in 0..2 {
        TestRequest::get("/dav/alice/media")
            .basic_auth("alice", "pw")
            .send(&service)
            .await
            .assert_status(StatusCode::OK);
        clock.advance(30);
    }
}

/// A different password is a different cache key, so it is checked remotely.
#[test_log::test(tokio::test)]
async fn other_password_is_not_served_from_cache() {
    let server = MockServer::start().await;
    mount_identity(&server, "alice", "pw", principal("alice", "alice/media", false), 1).await;
    let clock = Arc::new(ManualClock::new(3_000));
    let service = delegated_service(&server.uri(), clock).expect("valid service");

    TestRequest::get("/dav/alice/media")
        .basic_auth("alice", "pw")
        .send(&service)
        .await
        .assert_status(StatusCode::OK);

    assert_challenge(
        TestRequest::get("/dav/alice/media")
            .basic_auth("alice", "guess")
            .send(&service)
            .await,
    );
}
