use thiserror::Error;

use crate::identity::IdentityError;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    CoreError(#[from] wardav_core::error::CoreError),

    #[error("Credential store error: {0}")]
    CredentialStore(String),

    #[error("Password hash error: {0}")]
    PasswordHash(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
