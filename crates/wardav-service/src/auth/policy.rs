//! Area policy engine for delegated principals.
//!
//! A principal's area is the server base path followed by its `user_dir`.
//! Requests are allowed inside that subtree only; MKCOL is refused outright
//! and MOVE/COPY are judged by their `Destination` rather than the request
//! path.

use reqwest::Url;

use wardav_core::types::DavMethod;
use wardav_core::util::path::AreaPath;

use super::decision::{AuthDecision, DenyReason};
use crate::error::{ServiceError, ServiceResult};
use crate::identity::Principal;

#[derive(Debug, Clone)]
pub struct AreaPolicy {
    base: AreaPath,
}

impl AreaPolicy {
    /// ## Summary
    /// Creates a policy rooted at the server base path.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` if the base path escapes the root.
    pub fn new(base_path: &str) -> ServiceResult<Self> {
        let base = AreaPath::parse(base_path).ok_or_else(|| {
            ServiceError::InvalidConfiguration(format!("Invalid base path {base_path}"))
        })?;
        Ok(Self { base })
    }

    #[must_use]
    pub const fn base(&self) -> &AreaPath {
        &self.base
    }

    /// ## Summary
    /// Decides whether `principal` may perform `verb` on `path`.
    ///
    /// `path` is the percent-encoded request path and `destination` the raw
    /// `Destination` header. The decision is a pure function of its inputs.
    #[must_use]
    pub fn decide(
        &self,
        principal: &Principal,
        verb: &str,
        path: &str,
        destination: Option<&str>,
    ) -> AuthDecision {
        let (Some(_), Some(user_dir)) = (principal.username(), principal.user_dir()) else {
            return AuthDecision::Unauthorized(DenyReason::InvalidPrincipal);
        };
        let Some(home) = AreaPath::parse(user_dir).filter(|home| !home.is_empty()) else {
            return AuthDecision::Unauthorized(DenyReason::InvalidPrincipal);
        };
        let target = self.base.join(&home);

        match DavMethod::parse(verb) {
            Some(DavMethod::Mkcol) => {
                AuthDecision::Unauthorized(DenyReason::CollectionCreationDenied)
            }
            Some(method) if method.uses_destination() => {
                match destination.and_then(parse_destination) {
                    Some(dest) => in_area(&target, &dest, principal.is_superuser),
                    None => AuthDecision::Unauthorized(DenyReason::InvalidDestination),
                }
            }
            _ => match AreaPath::parse_encoded(path) {
                Some(requested) => in_area(&target, &requested, principal.is_superuser),
                None => AuthDecision::Unauthorized(DenyReason::OutsideArea),
            },
        }
    }
}

/// ## Summary
/// Extracts the normalized path from a `Destination` header.
///
/// Accepts an absolute http(s) URI or an absolute path. Query and fragment
/// are ignored. Returns `None` for anything else.
#[must_use]
pub fn parse_destination(header: &str) -> Option<AreaPath> {
    let header = header.trim();
    if header.starts_with("//") {
        return None;
    }
    if header.starts_with('/') {
        let raw_path = header.split(['?', '#']).next()?;
        return AreaPath::parse_encoded(raw_path);
    }

    let url = Url::parse(header).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    AreaPath::parse_encoded(url.path())
}

fn in_area(target: &AreaPath, requested: &AreaPath, is_superuser: bool) -> AuthDecision {
    if requested.starts_with(target) {
        return AuthDecision::Allowed;
    }

    let same_leaf = requested.len() == target.len() && requested.last() == target.last();
    if same_leaf && is_superuser {
        AuthDecision::Allowed
    } else if same_leaf {
        // Same shape as another principal's area root: force a re-prompt.
        AuthDecision::Unauthenticated(DenyReason::ForeignAreaRoot)
    } else {
        AuthDecision::Unauthorized(DenyReason::OutsideArea)
    }
}
