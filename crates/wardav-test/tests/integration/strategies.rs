#![allow(clippy::expect_used)]
//! The non-delegated strategies behind the same gate.

use salvo::http::StatusCode;
use wardav_service::auth::password::hash_password;

use super::helpers::*;

#[test_log::test(tokio::test)]
async fn none_lets_everyone_through() {
    let settings = settings_with_auth("method = \"none\"\n").expect("valid settings");
    let service = service_for(&settings).expect("valid service");

    TestRequest::mkcol("/dav/anything")
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .assert_body("anonymous");
}

#[test_log::test(tokio::test)]
async fn local_table_checks_passwords_only() {
    let hash = hash_password("wonderland").expect("hashable");
    let settings = settings_with_auth(&format!(
        "method = \"local\"\n\n[[auth.local.users]]\nusername = \"alice\"\npassword_hash = \"{hash}\"\n"
    ))
    .expect("valid settings");
    let service = service_for(&settings).expect("valid service");

    TestRequest::mkcol("/dav/bob/new")
        .basic_auth("alice", "wonderland")
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .assert_body("alice");

    assert_challenge(
        TestRequest::get("/dav/alice")
            .basic_auth("alice", "rabbit")
            .send(&service)
            .await,
    );
    assert_challenge(TestRequest::get("/dav/alice").send(&service).await);
}

#[test_log::test(tokio::test)]
async fn paths_outside_base_are_not_gated() {
    let settings = settings_with_auth("method = \"none\"\n").expect("valid settings");
    let service = service_for(&settings).expect("valid service");

    TestRequest::get("/elsewhere")
        .send(&service)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[test]
fn database_without_store_fails_at_startup() {
    let settings =
        settings_with_auth("method = \"database\"\n\n[auth.database]\nurl = \"postgres://db\"\n")
            .expect("valid settings");
    assert!(service_for(&settings).is_err());
}
