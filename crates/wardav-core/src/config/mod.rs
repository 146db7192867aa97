use std::collections::HashSet;

use anyhow::Result;
use config::{Config, ConfigBuilder, builder::DefaultState};
use serde::Deserialize;

use crate::constants::{
    DEFAULT_CACHE_BUCKET_SECS, DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_REALM, DEFAULT_TIMEOUT_SECS,
};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Authentication strategy selected at startup. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Every request is allowed without credentials.
    #[serde(rename = "none")]
    NoAuth,
    /// Credentials are checked against the in-process table in `auth.local`.
    Local,
    /// Credentials are checked against an external credential store.
    Database,
    /// Credentials and area are resolved by the remote identity service.
    Delegated,
}

impl AuthMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoAuth => "none",
            Self::Local => "local",
            Self::Database => "database",
            Self::Delegated => "delegated",
        }
    }
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    pub local: Option<LocalAuthConfig>,
    pub database: Option<DatabaseAuthConfig>,
    pub delegated: Option<DelegatedAuthConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalAuthConfig {
    pub users: Vec<LocalUserConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalUserConfig {
    pub username: String,
    /// Argon2 PHC string, see the `hash_password` binary.
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseAuthConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DelegatedAuthConfig {
    /// Base URL of the identity service, e.g. `https://id.example.com`.
    pub server_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Width of the memoization time bucket.
    #[serde(default = "default_cache_bucket_secs")]
    pub cache_bucket_secs: u64,
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_cache_bucket_secs() -> u64 {
    DEFAULT_CACHE_BUCKET_SECS
}

const fn default_cache_max_entries() -> usize {
    DEFAULT_CACHE_MAX_ENTRIES
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path prefix the DAV tree is served under; areas are computed relative to it.
    pub base_path: String,
    /// Realm advertised in `WWW-Authenticate` challenges.
    pub realm: String,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the bind address as a string in the format "host:port".
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from environment variables and an optional `config.toml`.
    /// Environment variables (prefix `WARDAV`, `__` between nesting levels)
    /// take precedence over file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Self::builder_with_defaults()?
            .add_source(config::File::with_name("config.toml").required(false))
            .add_source(
                config::Environment::with_prefix("WARDAV")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?)
    }

    /// ## Summary
    /// Parses settings from a TOML document layered over the defaults.
    ///
    /// ## Errors
    /// Returns an error if the document is invalid or required keys are missing.
    pub fn from_toml_str(toml: &str) -> CoreResult<Self> {
        Ok(Self::builder_with_defaults()?
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize::<Settings>()?)
    }

    fn builder_with_defaults() -> CoreResult<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8008)?
            .set_default("server.base_path", "/")?
            .set_default("server.realm", DEFAULT_REALM)?
            .set_default("logging.level", "info")?)
    }

    /// ## Summary
    /// Checks the settings once at startup.
    ///
    /// The auth method must have its own section and no other method's
    /// section may be present, so exactly one strategy is ever configured.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` describing the first problem found.
    pub fn validate(&self) -> CoreResult<()> {
        self.server.validate()?;
        self.auth.validate()?;

        if self.auth.method == AuthMethod::NoAuth {
            tracing::warn!("Authentication disabled!");
        }
        tracing::info!(
            auth_method = %self.auth.method,
            base_path = %self.server.base_path,
            "Configuration validated"
        );
        Ok(())
    }
}

impl ServerConfig {
    fn validate(&self) -> CoreResult<()> {
        let host = self.host.trim();
        if host.is_empty() || host.contains('/') || host.contains(':') {
            return Err(CoreError::InvalidConfiguration(format!(
                "Malformed host {}",
                self.host
            )));
        }
        if !self.base_path.starts_with('/') {
            return Err(CoreError::InvalidConfiguration(format!(
                "Base path must start with '/': {}",
                self.base_path
            )));
        }
        Ok(())
    }
}

impl AuthConfig {
    fn validate(&self) -> CoreResult<()> {
        let present = [
            (AuthMethod::Local, self.local.is_some()),
            (AuthMethod::Database, self.database.is_some()),
            (AuthMethod::Delegated, self.delegated.is_some()),
        ];
        for (method, is_present) in present {
            if is_present && method != self.method {
                return Err(CoreError::InvalidConfiguration(format!(
                    "'{method}' auth settings are incompatible with auth method '{}'",
                    self.method
                )));
            }
        }

        match self.method {
            AuthMethod::NoAuth => Ok(()),
            AuthMethod::Local => self
                .local
                .as_ref()
                .ok_or_else(|| missing_section(self.method))?
                .validate(),
            AuthMethod::Database => self
                .database
                .as_ref()
                .ok_or_else(|| missing_section(self.method))?
                .validate(),
            AuthMethod::Delegated => self
                .delegated
                .as_ref()
                .ok_or_else(|| missing_section(self.method))?
                .validate(),
        }
    }
}

fn missing_section(method: AuthMethod) -> CoreError {
    CoreError::InvalidConfiguration(format!(
        "Auth method '{method}' requires an [auth.{method}] section"
    ))
}

impl LocalAuthConfig {
    fn validate(&self) -> CoreResult<()> {
        if self.users.is_empty() {
            return Err(CoreError::InvalidConfiguration(
                "Missing user/password".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for user in &self.users {
            if user.username.is_empty() || user.password_hash.is_empty() {
                return Err(CoreError::InvalidConfiguration(
                    "Missing user/password".to_string(),
                ));
            }
            if !seen.insert(user.username.as_str()) {
                return Err(CoreError::InvalidConfiguration(format!(
                    "Duplicate local user {}",
                    user.username
                )));
            }
        }
        Ok(())
    }
}

impl DatabaseAuthConfig {
    fn validate(&self) -> CoreResult<()> {
        if self.url.trim().is_empty() {
            return Err(CoreError::InvalidConfiguration(
                "Database auth requires a url".to_string(),
            ));
        }
        Ok(())
    }
}

impl DelegatedAuthConfig {
    fn validate(&self) -> CoreResult<()> {
        let url = url::Url::parse(&self.server_url).map_err(|e| {
            CoreError::InvalidConfiguration(format!(
                "Invalid identity server url {}: {e}",
                self.server_url
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(CoreError::InvalidConfiguration(format!(
                "Identity server url must be http(s): {}",
                self.server_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(CoreError::InvalidConfiguration(
                "timeout_secs must be positive".to_string(),
            ));
        }
        if self.cache_bucket_secs == 0 {
            return Err(CoreError::InvalidConfiguration(
                "cache_bucket_secs must be positive".to_string(),
            ));
        }
        if self.cache_max_entries == 0 {
            return Err(CoreError::InvalidConfiguration(
                "cache_max_entries must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file, then validates it.
///
/// ## Errors
/// Returns an error if loading, deserializing or validating the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    settings.validate()?;
    Ok(settings)
}
