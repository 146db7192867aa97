//! Request, decision and outcome types.

/// Why a request was refused. Carried for logging only; the status a client
/// sees depends solely on the decision variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenyReason {
    /// The credential check said no.
    RejectedCredentials,
    /// The identity service answered for a different user than requested.
    UsernameMismatch,
    /// The path looks like another principal's area root.
    ForeignAreaRoot,
    /// The principal lacks `username` or `user_dir`.
    InvalidPrincipal,
    OutsideArea,
    CollectionCreationDenied,
    /// MOVE/COPY without a usable `Destination` header.
    InvalidDestination,
}

impl DenyReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RejectedCredentials => "rejected_credentials",
            Self::UsernameMismatch => "username_mismatch",
            Self::ForeignAreaRoot => "foreign_area_root",
            Self::InvalidPrincipal => "invalid_principal",
            Self::OutsideArea => "outside_area",
            Self::CollectionCreationDenied => "collection_creation_denied",
            Self::InvalidDestination => "invalid_destination",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the area policy for an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Allowed,
    /// Maps to 401: the client should drop cached credentials and re-prompt.
    Unauthenticated(DenyReason),
    /// Maps to 403: hard refusal.
    Unauthorized(DenyReason),
}

impl AuthDecision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Result of an `AuthBackend` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Allowed,
    Unauthenticated(DenyReason),
    Unauthorized(DenyReason),
    /// Username or password missing; treated as a generic deny.
    InvalidParams,
}

impl AuthOutcome {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

impl From<AuthDecision> for AuthOutcome {
    fn from(decision: AuthDecision) -> Self {
        match decision {
            AuthDecision::Allowed => Self::Allowed,
            AuthDecision::Unauthenticated(reason) => Self::Unauthenticated(reason),
            AuthDecision::Unauthorized(reason) => Self::Unauthorized(reason),
        }
    }
}

/// Everything the dispatcher hands to a backend for one request.
#[derive(Clone, Copy)]
pub struct AuthRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub verb: &'a str,
    /// Request path as received, still percent-encoded.
    pub path: &'a str,
    /// Raw `Destination` header; only populated for MOVE/COPY.
    pub destination: Option<&'a str>,
}

impl AuthRequest<'_> {
    #[must_use]
    pub const fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl std::fmt::Debug for AuthRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("verb", &self.verb)
            .field("path", &self.path)
            .field("destination", &self.destination)
            .finish()
    }
}
