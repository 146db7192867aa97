use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use salvo::http::StatusCode;
use salvo::http::header::{AUTHORIZATION, HeaderValue, WWW_AUTHENTICATE};
use salvo::{Depot, FlowCtrl, Request, Response};

use wardav_core::constants::DESTINATION_HEADER;
use wardav_core::error::CoreError;
use wardav_core::types::DavMethod;
use wardav_service::auth::{AuthBackend, AuthOutcome, AuthRequest};
use wardav_service::error::ServiceError;
use wardav_service::identity::IdentityError;

use crate::error::AppResult;

pub mod depot_keys {
    /// Username of the request's authenticated caller. Absent in `none` mode.
    pub const AUTHENTICATED_USER: &str = "wardav.authenticated_user";
}

/// ## Summary
/// Returns the username the gate authenticated for this request, if any.
#[must_use]
pub fn get_user_from_depot(depot: &Depot) -> Option<&str> {
    depot
        .get::<String>(depot_keys::AUTHENTICATED_USER)
        .ok()
        .map(String::as_str)
}

/// Basic credentials as sent by the client. Missing or malformed headers
/// yield empty strings, which every backend reports as `InvalidParams`.
#[derive(Default, PartialEq, Eq)]
struct Credentials {
    username: String,
    password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    fn from_header(value: Option<&HeaderValue>) -> Self {
        value
            .and_then(|value| value.to_str().ok())
            .and_then(Self::parse_basic)
            .unwrap_or_default()
    }

    fn parse_basic(header: &str) -> Option<Self> {
        let (scheme, encoded) = header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }
        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

/// ## Summary
/// Maps a backend failure to the status the client sees.
///
/// Identity service outages are kept distinct from auth denials so that
/// clients do not discard valid credentials during an outage.
#[must_use]
pub fn status_for_error(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Identity(IdentityError::Connection { .. }) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ServiceError::Identity(IdentityError::Protocol { .. }) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// ## Summary
/// Authentication gate for the DAV subtree.
///
/// Runs the configured `AuthBackend` for every request, whatever the verb.
/// Allowed requests continue with the username in the depot; everything
/// else is answered here.
pub struct AuthGate {
    backend: Arc<AuthBackend>,
    challenge: HeaderValue,
}

impl AuthGate {
    /// ## Errors
    /// Returns `InvalidConfiguration` if `realm` cannot be sent in a header.
    pub fn new(backend: Arc<AuthBackend>, realm: &str) -> AppResult<Self> {
        let challenge = HeaderValue::from_str(&format!("Basic realm=\"{realm}\"")).map_err(|e| {
            CoreError::InvalidConfiguration(format!("Realm {realm:?} is not a valid header: {e}"))
        })?;
        Ok(Self { backend, challenge })
    }

    fn deny(&self, res: &mut Response, status: StatusCode) {
        res.status_code(status);
        if status == StatusCode::UNAUTHORIZED {
            res.headers_mut()
                .insert(WWW_AUTHENTICATE, self.challenge.clone());
        }
        res.body(status.canonical_reason().unwrap_or_default());
    }
}

#[salvo::async_trait]
impl salvo::Handler for AuthGate {
    #[tracing::instrument(skip_all, fields(
        request_id = %uuid::Uuid::now_v7(),
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        let credentials = Credentials::from_header(req.headers().get(AUTHORIZATION));
        let verb = req.method().as_str().to_string();
        let destination = DavMethod::parse(&verb)
            .filter(|method| method.uses_destination())
            .and_then(|_| req.headers().get(DESTINATION_HEADER))
            .and_then(|value| value.to_str().ok());

        let request = AuthRequest {
            username: &credentials.username,
            password: &credentials.password,
            verb: &verb,
            path: req.uri().path(),
            destination,
        };

        let outcome = self.backend.authenticate(&request).await;
        tracing::trace!(?outcome, "Authentication finished");

        match outcome {
            Ok(AuthOutcome::Allowed) => {
                if !credentials.username.is_empty() {
                    depot.insert(depot_keys::AUTHENTICATED_USER, credentials.username);
                }
                ctrl.call_next(req, depot, res).await;
            }
            Ok(AuthOutcome::Unauthenticated(reason)) => {
                tracing::info!(%reason, "Request not authenticated");
                self.deny(res, StatusCode::UNAUTHORIZED);
                ctrl.skip_rest();
            }
            Ok(AuthOutcome::InvalidParams) => {
                tracing::debug!("Request without credentials");
                self.deny(res, StatusCode::UNAUTHORIZED);
                ctrl.skip_rest();
            }
            Ok(AuthOutcome::Unauthorized(reason)) => {
                tracing::info!(%reason, "Request not authorized");
                self.deny(res, StatusCode::FORBIDDEN);
                ctrl.skip_rest();
            }
            Err(err) => {
                let status = status_for_error(&err);
                tracing::error!(
                    error = %err,
                    status = status.as_u16(),
                    "Authentication failed with error"
                );
                self.deny(res, status);
                ctrl.skip_rest();
            }
        }
    }
}
