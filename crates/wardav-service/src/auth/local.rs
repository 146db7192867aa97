use std::collections::HashMap;

use wardav_core::config::LocalAuthConfig;

use super::decision::{AuthOutcome, AuthRequest, DenyReason};
use super::password::{check_hash_format, verify_password};
use crate::error::{ServiceError, ServiceResult};

/// Username to Argon2 hash table loaded from `[auth.local]`.
///
/// Grants every path to any user whose password verifies.
#[derive(Debug, Clone)]
pub struct LocalTableBackend {
    users: HashMap<String, String>,
}

impl LocalTableBackend {
    /// ## Summary
    /// Builds the table from configuration, checking every stored hash.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` for a duplicate user or a malformed hash.
    pub fn from_config(config: &LocalAuthConfig) -> ServiceResult<Self> {
        let mut users = HashMap::with_capacity(config.users.len());
        for user in &config.users {
            check_hash_format(&user.password_hash).map_err(|e| {
                ServiceError::InvalidConfiguration(format!("User {}: {e}", user.username))
            })?;
            if users
                .insert(user.username.clone(), user.password_hash.clone())
                .is_some()
            {
                return Err(ServiceError::InvalidConfiguration(format!(
                    "Duplicate local user {}",
                    user.username
                )));
            }
        }

        tracing::info!(users = users.len(), "Local user table loaded");
        Ok(Self { users })
    }

    /// ## Summary
    /// Checks the request's credentials against the table.
    ///
    /// Argon2 verification runs on the blocking pool.
    ///
    /// ## Errors
    /// Returns `PasswordHash` if a stored hash cannot be used or the
    /// verification task dies.
    #[tracing::instrument(skip_all, fields(username = request.username))]
    pub async fn authenticate(&self, request: &AuthRequest<'_>) -> ServiceResult<AuthOutcome> {
        if !request.has_credentials() {
            return Ok(AuthOutcome::InvalidParams);
        }

        let Some(hash) = self.users.get(request.username) else {
            tracing::debug!("Unknown local user");
            return Ok(AuthOutcome::Unauthenticated(DenyReason::RejectedCredentials));
        };

        let password = request.password.to_string();
        let hash = hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| ServiceError::PasswordHash(format!("Verification task failed: {e}")))??;

        if verified {
            Ok(AuthOutcome::Allowed)
        } else {
            tracing::debug!("Local password mismatch");
            Ok(AuthOutcome::Unauthenticated(DenyReason::RejectedCredentials))
        }
    }
}
