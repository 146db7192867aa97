use serde::{Deserialize, Deserializer, Serialize};

/// Identity record returned by the identity service for a credential pair.
///
/// `username` and `user_dir` stay optional here so that a payload missing
/// either can still be decoded and then refused by the policy engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(default)]
    pub username: Option<String>,
    /// Home fragment relative to the server base path, e.g. `alice/media`.
    #[serde(default)]
    pub user_dir: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_superuser: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Principal {
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns the home fragment, treating a blank `user_dir` as absent.
    #[must_use]
    pub fn user_dir(&self) -> Option<&str> {
        self.user_dir.as_deref().filter(|dir| !dir.trim().is_empty())
    }
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_default())
}

/// Opaque bearer token issued by `POST /api/v0/auth`.
#[derive(Clone, PartialEq, Eq)]
pub struct Ticket(String);

impl Ticket {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Ticket(<redacted>)")
    }
}
