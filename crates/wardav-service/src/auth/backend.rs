//! Strategy family selected once at startup.

use wardav_core::config::{AuthMethod, Settings};

use super::database::{DatabaseBackend, StoreConnector};
use super::decision::{AuthOutcome, AuthRequest};
use super::delegated::DelegatedBackend;
use super::local::LocalTableBackend;
use crate::error::{ServiceError, ServiceResult};

pub enum AuthBackend {
    AlwaysAllow,
    LocalTable(LocalTableBackend),
    Database(DatabaseBackend),
    Delegated(DelegatedBackend),
}

impl AuthBackend {
    /// ## Summary
    /// Builds the backend named by `auth.method`.
    ///
    /// `connector` is only consulted for the `database` method, which hands
    /// it the `[auth.database]` section.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` if the selected method's section is
    /// missing or unusable, or if `database` is selected without a
    /// connector. Connector failures are propagated.
    pub fn from_settings(
        settings: &Settings,
        connector: Option<&StoreConnector>,
    ) -> ServiceResult<Self> {
        let auth = &settings.auth;
        let missing = |section: &str| {
            ServiceError::InvalidConfiguration(format!(
                "Auth method '{}' requires an [auth.{section}] section",
                auth.method
            ))
        };

        let backend = match auth.method {
            AuthMethod::NoAuth => Self::AlwaysAllow,
            AuthMethod::Local => {
                let local = auth.local.as_ref().ok_or_else(|| missing("local"))?;
                Self::LocalTable(LocalTableBackend::from_config(local)?)
            }
            AuthMethod::Database => {
                let database = auth.database.as_ref().ok_or_else(|| missing("database"))?;
                let connector = connector.ok_or_else(|| {
                    ServiceError::InvalidConfiguration(
                        "Auth method 'database' requires a credential store".to_string(),
                    )
                })?;
                Self::Database(DatabaseBackend::connect(database, connector)?)
            }
            AuthMethod::Delegated => {
                let delegated = auth.delegated.as_ref().ok_or_else(|| missing("delegated"))?;
                Self::Delegated(DelegatedBackend::from_config(
                    delegated,
                    &settings.server.base_path,
                )?)
            }
        };

        tracing::info!(method = %backend.method(), "Authentication backend ready");
        Ok(backend)
    }

    #[must_use]
    pub const fn method(&self) -> AuthMethod {
        match self {
            Self::AlwaysAllow => AuthMethod::NoAuth,
            Self::LocalTable(_) => AuthMethod::Local,
            Self::Database(_) => AuthMethod::Database,
            Self::Delegated(_) => AuthMethod::Delegated,
        }
    }

    /// ## Summary
    /// Runs the selected strategy for one request.
    ///
    /// ## Errors
    /// Returns a service error when the strategy cannot reach a decision,
    /// e.g. the identity service or credential store is unavailable.
    pub async fn authenticate(&self, request: &AuthRequest<'_>) -> ServiceResult<AuthOutcome> {
        match self {
            Self::AlwaysAllow => Ok(AuthOutcome::Allowed),
            Self::LocalTable(backend) => backend.authenticate(request).await,
            Self::Database(backend) => backend.authenticate(request).await,
            Self::Delegated(backend) => backend.authenticate(request).await,
        }
    }
}
