//! Credential validation against an external user store.

use std::sync::Arc;

use async_trait::async_trait;

use wardav_core::config::DatabaseAuthConfig;

use super::decision::{AuthOutcome, AuthRequest, DenyReason};
use crate::error::ServiceResult;

/// Source of truth for username/password pairs.
///
/// Implementations are supplied by the embedding application; none ships
/// with this crate.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// ## Summary
    /// Returns whether `password` is valid for `username`.
    ///
    /// ## Errors
    /// Returns `CredentialStore` if the store cannot be queried.
    async fn verify(&self, username: &str, password: &str) -> ServiceResult<bool>;
}

/// Opens the `CredentialStore` described by `[auth.database]`.
///
/// Supplied by the embedding application alongside its store type.
pub type StoreConnector =
    dyn Fn(&DatabaseAuthConfig) -> ServiceResult<Arc<dyn CredentialStore>> + Send + Sync;

#[derive(Clone)]
pub struct DatabaseBackend {
    store: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for DatabaseBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseBackend").finish_non_exhaustive()
    }
}

impl DatabaseBackend {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// ## Summary
    /// Opens the store for `config` through `connector`.
    ///
    /// ## Errors
    /// Propagates the connector's failure.
    pub fn connect(config: &DatabaseAuthConfig, connector: &StoreConnector) -> ServiceResult<Self> {
        let store = connector(config)?;
        tracing::debug!("Credential store connected");
        Ok(Self::new(store))
    }

    /// ## Summary
    /// Validates the request's credentials with the store. No path policy applies.
    ///
    /// ## Errors
    /// Propagates store failures.
    #[tracing::instrument(skip_all, fields(username = request.username))]
    pub async fn authenticate(&self, request: &AuthRequest<'_>) -> ServiceResult<AuthOutcome> {
        if !request.has_credentials() {
            return Ok(AuthOutcome::InvalidParams);
        }

        if self.store.verify(request.username, request.password).await? {
            Ok(AuthOutcome::Allowed)
        } else {
            Ok(AuthOutcome::Unauthenticated(DenyReason::RejectedCredentials))
        }
    }
}
