//! Two-phase handshake with the identity service.
//!
//! 1. `POST {server}/api/v0/auth` with basic credentials returns a ticket.
//! 2. `GET {server}/api/v0/users/{username}` with the ticket in `doob-tkt`
//!    returns the principal as JSON.
//!
//! Any 4xx from either call means "not authenticated" and is reported as
//! `Ok(None)`. Statuses outside 2xx/4xx and empty bodies are protocol
//! errors; transport failures and timeouts are connection errors.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, Url};
use sha2::{Digest, Sha256};

use wardav_core::config::DelegatedAuthConfig;
use wardav_core::constants::{
    IDENTITY_API_SEGMENTS, IDENTITY_TICKET_RESOURCE, IDENTITY_USERS_RESOURCE, TICKET_HEADER,
};

use super::cache::BucketCache;
use super::clock::{Clock, SystemClock};
use super::error::{IdentityError, IdentityResult};
use super::principal::{Principal, Ticket};
use crate::error::{ServiceError, ServiceResult};

/// Longest response body excerpt carried in a protocol error.
const BODY_EXCERPT_LEN: usize = 200;

/// Memoization key: method, URL and a digest of the call arguments, so raw
/// credentials are never retained by the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CallKey {
    method: Method,
    url: String,
    args: [u8; 32],
}

#[derive(Clone, Copy)]
enum CallArgs<'a> {
    Basic {
        username: &'a str,
        password: &'a str,
    },
    Ticket(&'a Ticket),
}

impl CallArgs<'_> {
    fn digest(self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        match self {
            Self::Basic { username, password } => {
                hasher.update(b"basic");
                hasher.update(username.len().to_be_bytes());
                hasher.update(username.as_bytes());
                hasher.update(password.as_bytes());
            }
            Self::Ticket(ticket) => {
                hasher.update(b"ticket");
                hasher.update(ticket.as_str().as_bytes());
            }
        }
        hasher.finalize().into()
    }
}

/// Client for the remote identity service.
///
/// Holds one pooled `reqwest::Client` shared by every request thread and the
/// memoization cache for both handshake calls.
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: Url,
    ticket_url: Url,
    cache: BucketCache<CallKey, Option<String>, IdentityError>,
}

impl IdentityClient {
    /// ## Summary
    /// Builds a client from the delegated auth settings using the system clock.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` if the server URL is unusable or the
    /// HTTP client cannot be built.
    pub fn new(config: &DelegatedAuthConfig) -> ServiceResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// ## Summary
    /// Builds a client whose cache buckets follow `clock`.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` if the server URL is unusable or the
    /// HTTP client cannot be built.
    pub fn with_clock(config: &DelegatedAuthConfig, clock: Arc<dyn Clock>) -> ServiceResult<Self> {
        let base_url = Url::parse(&config.server_url).map_err(|e| {
            ServiceError::InvalidConfiguration(format!(
                "Invalid identity server url {}: {e}",
                config.server_url
            ))
        })?;
        let ticket_url = endpoint(&base_url, &[IDENTITY_TICKET_RESOURCE]).ok_or_else(|| {
            ServiceError::InvalidConfiguration(format!(
                "Identity server url cannot be a base: {}",
                config.server_url
            ))
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ServiceError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        tracing::info!(
            server = %base_url,
            timeout_secs = config.timeout_secs,
            cache_bucket_secs = config.cache_bucket_secs,
            "Identity client configured"
        );

        Ok(Self {
            http,
            base_url,
            ticket_url,
            cache: BucketCache::new(clock, config.cache_bucket_secs, config.cache_max_entries),
        })
    }

    /// ## Summary
    /// Exchanges a credential pair for a ticket.
    ///
    /// Returns `Ok(None)` when the identity service rejects the credentials.
    ///
    /// ## Errors
    /// Returns `Connection` on network failure or timeout and `Protocol` on an
    /// unexpected status or empty body.
    pub async fn request_ticket(
        &self,
        username: &str,
        password: &str,
    ) -> IdentityResult<Option<Ticket>> {
        let body = self
            .remote_call(
                Method::POST,
                self.ticket_url.clone(),
                CallArgs::Basic { username, password },
            )
            .await?;
        Ok(body.map(Ticket::new))
    }

    /// ## Summary
    /// Fetches the principal for `username` using a previously issued ticket.
    ///
    /// Returns `Ok(None)` when the identity service refuses the ticket.
    ///
    /// ## Errors
    /// Returns `Connection` on network failure or timeout and `Protocol` on an
    /// unexpected status, an empty body or a body that is not a JSON object.
    pub async fn fetch_principal(
        &self,
        username: &str,
        ticket: &Ticket,
    ) -> IdentityResult<Option<Principal>> {
        let url = endpoint(&self.base_url, &[IDENTITY_USERS_RESOURCE, username])
            .ok_or_else(|| IdentityError::Endpoint(self.base_url.to_string()))?;

        let Some(body) = self
            .remote_call(Method::GET, url, CallArgs::Ticket(ticket))
            .await?
        else {
            return Ok(None);
        };

        serde_json::from_str::<Principal>(&body)
            .map(Some)
            .map_err(|e| IdentityError::Protocol {
                method: Method::GET.to_string(),
                resource: IDENTITY_USERS_RESOURCE.to_string(),
                reason: format!("invalid principal payload: {e}"),
            })
    }

    /// ## Summary
    /// Turns a credential pair into a principal via ticket then lookup.
    ///
    /// A rejection at either step yields `Ok(None)`, so callers cannot tell a
    /// refused ticket from refused credentials.
    ///
    /// ## Errors
    /// Propagates `Connection` and `Protocol` errors from either call.
    #[tracing::instrument(skip(self, password))]
    pub async fn authenticate_credential(
        &self,
        username: &str,
        password: &str,
    ) -> IdentityResult<Option<Principal>> {
        let Some(ticket) = self.request_ticket(username, password).await? else {
            tracing::debug!("Ticket request rejected");
            return Ok(None);
        };

        let principal = self.fetch_principal(username, &ticket).await?;
        if principal.is_none() {
            tracing::debug!("Principal lookup rejected");
        }
        Ok(principal)
    }

    async fn remote_call(
        &self,
        method: Method,
        url: Url,
        args: CallArgs<'_>,
    ) -> IdentityResult<Option<String>> {
        let key = CallKey {
            method: method.clone(),
            url: url.to_string(),
            args: args.digest(),
        };
        self.cache
            .get_or_try_insert_with(key, || self.send(method, url, args))
            .await
    }

    #[tracing::instrument(skip_all, fields(method = %method, url = %url))]
    async fn send(
        &self,
        method: Method,
        url: Url,
        args: CallArgs<'_>,
    ) -> IdentityResult<Option<String>> {
        tracing::debug!("Identity service request");

        let resource = resource_name(&url);
        let request = self.http.request(method.clone(), url);
        let request = match args {
            CallArgs::Basic { username, password } => request.basic_auth(username, Some(password)),
            CallArgs::Ticket(ticket) => request.header(TICKET_HEADER, ticket.as_str()),
        };

        let response = request
            .send()
            .await
            .map_err(|e| classify_send_error(&method, &resource, &e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!(error = %e, "Identity service connection error");
            IdentityError::Connection {
                method: method.to_string(),
                resource: resource.clone(),
                reason: e.to_string(),
            }
        })?;
        let body = body.trim();

        if !(status.is_success() || status.is_client_error()) || body.is_empty() {
            let excerpt: String = body.chars().take(BODY_EXCERPT_LEN).collect();
            return Err(IdentityError::Protocol {
                method: method.to_string(),
                resource,
                reason: format!("unexpected response, code {status} body {excerpt:?}"),
            });
        }

        if status.is_client_error() {
            // Bad credentials and any other 4xx refusal land here alike.
            tracing::warn!(status = %status, "Identity service refused request");
            return Ok(None);
        }

        Ok(Some(body.to_string()))
    }
}

fn classify_send_error(method: &Method, resource: &str, err: &reqwest::Error) -> IdentityError {
    if err.is_builder() {
        return IdentityError::Protocol {
            method: method.to_string(),
            resource: resource.to_string(),
            reason: format!("unusable request: {err}"),
        };
    }
    tracing::error!(error = %err, timeout = err.is_timeout(), "Identity service connection error");
    IdentityError::Connection {
        method: method.to_string(),
        resource: resource.to_string(),
        reason: err.to_string(),
    }
}

/// Appends `/api/v0/{segments..}` to `base`, percent-encoding each segment.
fn endpoint(base: &Url, segments: &[&str]) -> Option<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(IDENTITY_API_SEGMENTS.iter().chain(segments));
    Some(url)
}

/// Path below `/api/v0/`, used to label log lines and errors.
fn resource_name(url: &Url) -> String {
    let path = url.path();
    let prefix = format!("/{}/", IDENTITY_API_SEGMENTS.join("/"));
    path.find(&prefix)
        .map_or(path, |idx| &path[idx + prefix.len()..])
        .to_string()
}
