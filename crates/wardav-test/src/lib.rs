//! wardav gateway - integration test support.
//!
//! Builds gated salvo services for each auth strategy and a stand-in
//! resource layer that reports who the gate let through.

use std::sync::Arc;

use salvo::prelude::*;

use wardav_app::app::api::routes;
use wardav_app::middleware::auth::get_user_from_depot;
use wardav_core::config::Settings;
use wardav_service::auth::{AreaPolicy, AuthBackend, DelegatedBackend};
use wardav_service::identity::{Clock, IdentityClient};

/// Base path every test service mounts its DAV tree under.
pub const TEST_BASE_PATH: &str = "/dav";

/// Answers `200` with the authenticated username, or `anonymous`.
#[handler]
pub async fn echo_user(depot: &mut Depot, res: &mut Response) {
    let user = get_user_from_depot(depot).unwrap_or("anonymous").to_string();
    res.render(Text::Plain(user));
}

/// ## Summary
/// Parses test settings from an `[auth]` TOML fragment, with the DAV tree at `/dav`.
///
/// ## Errors
/// Returns an error if the fragment does not deserialize or validate.
pub fn settings_with_auth(auth_toml: &str) -> anyhow::Result<Settings> {
    let settings = Settings::from_toml_str(&format!(
        "[server]\nbase_path = \"{TEST_BASE_PATH}\"\nrealm = \"wardav-test\"\n\n[auth]\n{auth_toml}"
    ))?;
    settings.validate()?;
    Ok(settings)
}

/// ## Summary
/// Builds a service for `settings`, serving the DAV tree with `echo_user`.
///
/// ## Errors
/// Returns an error if the backend or router cannot be built.
pub fn service_for(settings: &Settings) -> anyhow::Result<Service> {
    let backend = AuthBackend::from_settings(settings, None)?;
    service_with_backend(backend, settings)
}

/// ## Errors
/// Returns an error if the router cannot be built.
pub fn service_with_backend(backend: AuthBackend, settings: &Settings) -> anyhow::Result<Service> {
    let router = routes(Arc::new(backend), settings, echo_user)?;
    Ok(Service::new(router))
}

/// ## Summary
/// Builds a delegated-auth service against `server_url` whose cache buckets
/// follow `clock`.
///
/// ## Errors
/// Returns an error if the settings, client or router cannot be built.
pub fn delegated_service(server_url: &str, clock: Arc<dyn Clock>) -> anyhow::Result<Service> {
    let settings = settings_with_auth(&format!(
        "method = \"delegated\"\n\n[auth.delegated]\nserver_url = \"{server_url}\"\ntimeout_secs = 2\ncache_bucket_secs = 30\n"
    ))?;
    let delegated = settings
        .auth
        .delegated
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("delegated section missing"))?;

    let backend = AuthBackend::Delegated(DelegatedBackend::new(
        IdentityClient::with_clock(delegated, clock)?,
        AreaPolicy::new(&settings.server.base_path)?,
    ));
    service_with_backend(backend, &settings)
}
