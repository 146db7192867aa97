//! Identity service fixtures shared by unit tests.

use wiremock::matchers::{basic_auth, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wardav_core::config::DelegatedAuthConfig;

pub(crate) fn delegated_config(server_url: &str) -> DelegatedAuthConfig {
    DelegatedAuthConfig {
        server_url: server_url.to_string(),
        timeout_secs: 5,
        cache_bucket_secs: 30,
        cache_max_entries: 1_000,
    }
}

/// Mounts `POST /api/v0/auth` for one credential pair, expecting `calls` hits.
pub(crate) async fn mount_ticket(
    server: &MockServer,
    username: &str,
    password: &str,
    status: u16,
    body: &str,
    calls: u64,
) {
    Mock::given(method("POST"))
        .and(path("/api/v0/auth"))
        .and(basic_auth(username, password))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .expect(calls)
        .mount(server)
        .await;
}

/// Mounts `GET /api/v0/users/{username}` for one ticket, expecting `calls` hits.
pub(crate) async fn mount_principal(
    server: &MockServer,
    username: &str,
    ticket: &str,
    response: ResponseTemplate,
    calls: u64,
) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v0/users/{username}")))
        .and(header("doob-tkt", ticket))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}
