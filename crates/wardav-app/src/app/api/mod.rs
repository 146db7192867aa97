mod app_specific;
pub mod dav;

use std::sync::Arc;

use salvo::{Handler, Router};

use wardav_core::config::Settings;
use wardav_core::constants::API_ROUTE_COMPONENT;
use wardav_service::auth::AuthBackend;

use crate::error::AppResult;
use crate::middleware::auth::AuthGate;

/// ## Summary
/// Builds the full router: app endpoints first, then the gated DAV tree at
/// `server.base_path` served by `resource`.
///
/// ## Errors
/// Returns an error if the configured realm cannot be used in a challenge.
pub fn routes<H: Handler>(
    backend: Arc<AuthBackend>,
    settings: &Settings,
    resource: H,
) -> AppResult<Router> {
    let gate = AuthGate::new(backend, &settings.server.realm)?;

    Ok(Router::new()
        .push(Router::with_path(API_ROUTE_COMPONENT).push(app_specific::routes()))
        .push(
            Router::with_path(dav::route_pattern(&settings.server.base_path))
                .hoop(gate)
                .goal(resource),
        ))
}
