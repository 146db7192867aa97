//! Delegated authentication: the identity service vouches for the
//! credentials, the area policy decides the path.

use wardav_core::config::DelegatedAuthConfig;

use super::decision::{AuthOutcome, AuthRequest, DenyReason};
use super::policy::AreaPolicy;
use crate::error::ServiceResult;
use crate::identity::IdentityClient;

pub struct DelegatedBackend {
    client: IdentityClient,
    policy: AreaPolicy,
}

impl DelegatedBackend {
    #[must_use]
    pub const fn new(client: IdentityClient, policy: AreaPolicy) -> Self {
        Self { client, policy }
    }

    /// ## Summary
    /// Builds the identity client and area policy from configuration.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` if the server URL or base path is unusable.
    pub fn from_config(config: &DelegatedAuthConfig, base_path: &str) -> ServiceResult<Self> {
        Ok(Self::new(
            IdentityClient::new(config)?,
            AreaPolicy::new(base_path)?,
        ))
    }

    /// ## Summary
    /// Authenticates the credential remotely, then applies the area policy.
    ///
    /// ## Errors
    /// Returns `ServiceError::Identity` when the identity service is
    /// unreachable or answers outside its protocol. Such failures are never
    /// reported as a deny.
    #[tracing::instrument(
        skip_all,
        fields(username = request.username, verb = request.verb, path = request.path)
    )]
    pub async fn authenticate(&self, request: &AuthRequest<'_>) -> ServiceResult<AuthOutcome> {
        if !request.has_credentials() {
            return Ok(AuthOutcome::InvalidParams);
        }

        let Some(principal) = self
            .client
            .authenticate_credential(request.username, request.password)
            .await?
        else {
            return Ok(AuthOutcome::Unauthenticated(DenyReason::RejectedCredentials));
        };

        if principal.username() != Some(request.username) {
            tracing::warn!(
                returned = principal.username().unwrap_or_default(),
                "Identity service answered for a different user"
            );
            return Ok(AuthOutcome::Unauthenticated(DenyReason::UsernameMismatch));
        }

        let decision = self.policy.decide(
            &principal,
            request.verb,
            request.path,
            request.destination,
        );
        if !decision.is_allowed() {
            tracing::debug!(?decision, "Request refused by area policy");
        }
        Ok(decision.into())
    }
}
