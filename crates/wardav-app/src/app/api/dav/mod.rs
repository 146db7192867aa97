//! Mount point for the DAV resource layer.
//!
//! The gateway only decides who may reach the tree; serving it is left to
//! whatever handler the caller mounts here.

use salvo::http::StatusCode;
use salvo::{Response, handler};

/// ## Summary
/// Turns the configured base path into a salvo pattern matching the base
/// itself and everything below it.
#[must_use]
pub fn route_pattern(base_path: &str) -> String {
    let base = base_path.trim_matches('/');
    if base.is_empty() {
        "{**rest}".to_string()
    } else {
        format!("{base}/{{**rest}}")
    }
}

/// Placeholder resource layer for deployments without one.
#[handler]
pub async fn not_implemented(res: &mut Response) {
    res.status_code(StatusCode::NOT_IMPLEMENTED);
}
