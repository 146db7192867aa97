use thiserror::Error;

/// Failures talking to the identity service.
///
/// Neither variant is a credential verdict: a rejected password is reported
/// as `Ok(None)` by the client, never as an error.
#[derive(Error, Debug, Clone)]
pub enum IdentityError {
    /// Network failure or timeout. Retryable.
    #[error("Identity service connection failed for {method} {resource}: {reason}")]
    Connection {
        method: String,
        resource: String,
        reason: String,
    },

    /// Unexpected status, empty body or undecodable payload.
    #[error("Identity service returned an unexpected response for {method} {resource}: {reason}")]
    Protocol {
        method: String,
        resource: String,
        reason: String,
    },

    #[error("Invalid identity service endpoint: {0}")]
    Endpoint(String),
}

impl IdentityError {
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }
}

pub type IdentityResult<T> = std::result::Result<T, IdentityError>;
