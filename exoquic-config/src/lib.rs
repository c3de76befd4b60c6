//! # Exoquic Config
//!
//! Configuration management for the Exoquic subscription authorization SDK.
//!
//! The server URL an authorizer talks to is derived through a fixed precedence
//! chain, exposed here as pure functions so it can be checked without any
//! network code:
//!
//! 1. an explicit server URL
//! 2. an explicit environment tag (`https://<env>.exoquic.com`)
//! 3. the `EXOQUIC_ENV` process environment variable
//! 4. the hardcoded `dev` tier
//!
//! Configurations can be built by hand, with [`AuthorizerConfigBuilder`], or
//! loaded from JSON/TOML files and prefixed environment variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Environment tag used when neither the caller nor the process supplies one
pub const DEFAULT_ENV: &str = "dev";

/// Process environment variable consulted for the environment tag
pub const ENV_VAR: &str = "EXOQUIC_ENV";

/// Environment variable prefix used by [`try_load_default_config`]
pub const DEFAULT_ENV_PREFIX: &str = "EXOQUIC";

/// How the authorization endpoint encodes a successful response body
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenFormat {
    /// The whole response body is the token
    #[default]
    PlainText,
    /// The body is a JSON object carrying the token in `accessToken`
    JsonAccessToken,
}

impl TokenFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_lowercase().as_str() {
            "plain" | "plain_text" | "text" => Ok(TokenFormat::PlainText),
            "json" | "json_access_token" => Ok(TokenFormat::JsonAccessToken),
            _ => Err(ConfigError::Parse(format!("Invalid token format: {}", value))),
        }
    }
}

/// Errors that can occur when working with authorizer configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("API key is required but was not provided. Please supply the key issued for your Exoquic organization.")]
    MissingApiKey,

    #[error("Invalid server URL: {0}. The URL must start with http:// or https://.")]
    InvalidServerUrl(String),

    #[error("I/O error occurred while reading configuration: {0}")]
    Io(String),

    #[error("Failed to parse configuration data: {0}")]
    Parse(String),

    #[error("Environment variable error: {0}")]
    EnvVar(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(error: std::io::Error) -> Self {
        ConfigError::Io(error.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        ConfigError::Parse(error.to_string())
    }
}

#[cfg(feature = "toml")]
impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::Parse(error.to_string())
    }
}

impl From<env::VarError> for ConfigError {
    fn from(error: env::VarError) -> Self {
        ConfigError::EnvVar(error.to_string())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Pick the environment tag: explicit tag, then the environment variable, then `dev`
pub fn resolve_env(explicit_env: Option<&str>, env_var_value: Option<&str>) -> String {
    non_empty(explicit_env)
        .or_else(|| non_empty(env_var_value))
        .unwrap_or(DEFAULT_ENV)
        .to_string()
}

/// Base address of the authorization service for an environment tag
pub fn server_url_for_env(env: &str) -> String {
    format!("https://{}.exoquic.com", env)
}

/// Resolve the server base URL from its sources in precedence order
///
/// An explicit server URL always wins and has any trailing `/` removed so the
/// endpoint path can be appended directly. Otherwise the URL is derived from
/// the environment tag chosen by [`resolve_env`].
pub fn resolve_server_url(
    explicit_server_url: Option<&str>,
    explicit_env: Option<&str>,
    env_var_value: Option<&str>,
) -> String {
    match non_empty(explicit_server_url) {
        Some(url) => url.trim_end_matches('/').to_string(),
        None => server_url_for_env(&resolve_env(explicit_env, env_var_value)),
    }
}

fn env_var_value() -> Option<String> {
    env::var(ENV_VAR).ok()
}

/// Configuration for a subscription authorizer
///
/// # Examples
///
/// ```
/// use exoquic_config::AuthorizerConfig;
///
/// let config = AuthorizerConfig::new("my-api-key")
///     .with_server_url("https://staging.exoquic.com");
/// assert_eq!(config.resolved_server_url(), "https://staging.exoquic.com");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizerConfig {
    pub api_key: String,
    /// Deployment environment tag, e.g. `dev` or `prod`
    #[serde(default)]
    pub env: Option<String>,
    /// Explicit server base URL; takes precedence over `env`
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub token_format: TokenFormat,
}

impl AuthorizerConfig {
    /// Create a configuration with only an API key; everything else defaults
    pub fn new(api_key: impl Into<String>) -> Self {
        AuthorizerConfig {
            api_key: api_key.into(),
            env: None,
            server_url: None,
            token_format: TokenFormat::default(),
        }
    }

    pub fn builder() -> AuthorizerConfigBuilder {
        AuthorizerConfigBuilder::new()
    }

    /// Convert this configuration to a builder for modification
    pub fn to_builder(&self) -> AuthorizerConfigBuilder {
        AuthorizerConfigBuilder::from_config(self)
    }

    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = Some(server_url.into());
        self
    }

    /// The server base URL this configuration points at
    ///
    /// Reads `EXOQUIC_ENV` from the process when neither `server_url` nor
    /// `env` is set.
    pub fn resolved_server_url(&self) -> String {
        resolve_server_url(
            self.server_url.as_deref(),
            self.env.as_deref(),
            env_var_value().as_deref(),
        )
    }

    /// Check that the API key is present and any explicit URL is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        if let Some(url) = non_empty(self.server_url.as_deref()) {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidServerUrl(url.to_string()));
            }
        }

        Ok(())
    }

    /// Create a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file_content = fs::read_to_string(path)?;
        let config: AuthorizerConfig = serde_json::from_str(&file_content)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration from a TOML file
    #[cfg(feature = "toml")]
    pub fn from_toml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file_content = fs::read_to_string(path)?;
        let config: AuthorizerConfig = toml::from_str(&file_content)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration from environment variables
    ///
    /// The environment variables should be named with the given prefix followed by:
    /// - API_KEY: The API key (required)
    /// - ENV: The deployment environment tag (optional)
    /// - SERVER_URL: An explicit server base URL (optional)
    /// - TOKEN_FORMAT: Either "plain" or "json" (optional, defaults to "plain")
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the API key is missing or any value is invalid.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let api_key = env::var(format!("{}_API_KEY", prefix))?;
        let env = optional_var(&format!("{}_ENV", prefix))?;
        let server_url = optional_var(&format!("{}_SERVER_URL", prefix))?;

        let token_format = match optional_var(&format!("{}_TOKEN_FORMAT", prefix))? {
            Some(value) => TokenFormat::parse(&value)?,
            None => TokenFormat::default(),
        };

        let config = AuthorizerConfig {
            api_key,
            env,
            server_url,
            token_format,
        };

        config.validate()?;
        Ok(config)
    }
}

fn optional_var(name: &str) -> Result<Option<String>, ConfigError> {
    match env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Builder for AuthorizerConfig
#[derive(Default, Debug)]
pub struct AuthorizerConfigBuilder {
    api_key: Option<String>,
    env: Option<String>,
    server_url: Option<String>,
    token_format: Option<TokenFormat>,
}

impl AuthorizerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new builder from an existing AuthorizerConfig
    pub fn from_config(config: &AuthorizerConfig) -> Self {
        Self {
            api_key: Some(config.api_key.clone()),
            env: config.env.clone(),
            server_url: config.server_url.clone(),
            token_format: Some(config.token_format),
        }
    }

    /// Set the API key sent in the `x-api-key` header
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the deployment environment tag
    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    /// Set an explicit server base URL
    pub fn server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = Some(server_url.into());
        self
    }

    /// Set how successful response bodies are interpreted
    pub fn token_format(mut self, token_format: TokenFormat) -> Self {
        self.token_format = Some(token_format);
        self
    }

    /// Build the AuthorizerConfig
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the server URL is invalid
    pub fn build(self) -> Result<AuthorizerConfig, ConfigError> {
        let config = AuthorizerConfig {
            api_key: self.api_key.ok_or(ConfigError::MissingApiKey)?,
            env: self.env,
            server_url: self.server_url,
            token_format: self.token_format.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}

/// Try to load a configuration from standard locations
///
/// This function attempts, in order:
/// 1. Environment variables with the prefix "EXOQUIC"
/// 2. A file at ./exoquic.json
/// 3. A file at ~/.exoquic/config.json
/// 4. A file at /etc/exoquic/config.json
/// 5. With the "toml" feature, the same paths with a `.toml` extension
///
/// Returns None if no configuration could be found.
pub fn try_load_default_config() -> Option<AuthorizerConfig> {
    if let Ok(config) = AuthorizerConfig::from_env(DEFAULT_ENV_PREFIX) {
        return Some(config);
    }

    let json_paths = [
        "./exoquic.json",
        "~/.exoquic/config.json",
        "/etc/exoquic/config.json",
    ];

    for path in json_paths.iter().filter_map(|p| expand_path(p)) {
        if path.exists() {
            if let Ok(config) = AuthorizerConfig::from_file(&path) {
                return Some(config);
            }
        }
    }

    #[cfg(feature = "toml")]
    {
        let toml_paths = [
            "./exoquic.toml",
            "~/.exoquic/config.toml",
            "/etc/exoquic/config.toml",
        ];

        for path in toml_paths.iter().filter_map(|p| expand_path(p)) {
            if path.exists() {
                if let Ok(config) = AuthorizerConfig::from_toml(&path) {
                    return Some(config);
                }
            }
        }
    }

    None
}

fn expand_path(path: &str) -> Option<std::path::PathBuf> {
    match path.strip_prefix("~/") {
        Some(stripped) => dirs::home_dir().map(|home| home.join(stripped)),
        None => Some(Path::new(path).to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolve_env_precedence() {
        assert_eq!(resolve_env(Some("prod"), Some("staging")), "prod");
        assert_eq!(resolve_env(None, Some("staging")), "staging");
        assert_eq!(resolve_env(None, None), "dev");
        // Blank values are treated as not provided
        assert_eq!(resolve_env(Some(""), Some("  ")), "dev");
    }

    #[test]
    fn test_resolve_server_url_precedence() {
        assert_eq!(
            resolve_server_url(Some("http://localhost:8080"), Some("prod"), Some("staging")),
            "http://localhost:8080"
        );
        assert_eq!(
            resolve_server_url(None, Some("prod"), Some("staging")),
            "https://prod.exoquic.com"
        );
        assert_eq!(
            resolve_server_url(None, None, Some("staging")),
            "https://staging.exoquic.com"
        );
        assert_eq!(resolve_server_url(None, None, None), "https://dev.exoquic.com");
    }

    #[test]
    fn test_resolve_server_url_strips_trailing_slash() {
        assert_eq!(
            resolve_server_url(Some("https://example.com/"), None, None),
            "https://example.com"
        );
    }

    #[test]
    fn test_expand_path_resolves_home() {
        match dirs::home_dir() {
            Some(home) => assert_eq!(expand_path("~/x"), Some(home.join("x"))),
            None => assert_eq!(expand_path("~/x"), None),
        }
        assert_eq!(
            expand_path("/etc/exoquic/config.json"),
            Some(Path::new("/etc/exoquic/config.json").to_path_buf())
        );
    }

    #[test]
    fn test_builder_requires_api_key() {
        match AuthorizerConfigBuilder::new().env("prod").build() {
            Err(ConfigError::MissingApiKey) => {}
            other => panic!("Expected MissingApiKey, got {:?}", other),
        }
    }

    #[test]
    fn test_builder_rejects_url_without_scheme() {
        let result = AuthorizerConfig::builder()
            .api_key("key")
            .server_url("dev.exoquic.com")
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidServerUrl(_))));
    }

    #[test]
    fn test_to_builder_round_trip() {
        let config = AuthorizerConfig::builder()
            .api_key("key")
            .env("prod")
            .token_format(TokenFormat::JsonAccessToken)
            .build()
            .unwrap();

        let modified = config
            .to_builder()
            .server_url("http://localhost:9000")
            .build()
            .unwrap();
        assert_eq!(modified.api_key, "key");
        assert_eq!(modified.env.as_deref(), Some("prod"));
        assert_eq!(modified.token_format, TokenFormat::JsonAccessToken);
        assert_eq!(modified.resolved_server_url(), "http://localhost:9000");
    }

    #[test]
    fn test_from_file_defaults_optional_fields() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("exoquic.json");
        fs::write(&file_path, r#"{ "api_key": "file-key", "env": "prod" }"#).unwrap();

        let config = AuthorizerConfig::from_file(&file_path).unwrap();
        assert_eq!(config.api_key, "file-key");
        assert_eq!(config.server_url, None);
        assert_eq!(config.token_format, TokenFormat::PlainText);
        assert_eq!(config.resolved_server_url(), "https://prod.exoquic.com");
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_from_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("exoquic.toml");
        fs::write(
            &file_path,
            r#"
                api_key = "toml-key"
                server_url = "https://events.example.com"
                token_format = "json_access_token"
            "#,
        )
        .unwrap();

        let config = AuthorizerConfig::from_toml(&file_path).unwrap();
        assert_eq!(config.api_key, "toml-key");
        assert_eq!(config.token_format, TokenFormat::JsonAccessToken);
        assert_eq!(config.resolved_server_url(), "https://events.example.com");
    }

    #[test]
    fn test_from_env_with_prefix() {
        env::set_var("EXOQUIC_CFG_TEST_API_KEY", "env-key");
        env::set_var("EXOQUIC_CFG_TEST_ENV", "prod");
        env::set_var("EXOQUIC_CFG_TEST_TOKEN_FORMAT", "json");

        let config = AuthorizerConfig::from_env("EXOQUIC_CFG_TEST").unwrap();
        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.env.as_deref(), Some("prod"));
        assert_eq!(config.server_url, None);
        assert_eq!(config.token_format, TokenFormat::JsonAccessToken);

        env::remove_var("EXOQUIC_CFG_TEST_API_KEY");
        env::remove_var("EXOQUIC_CFG_TEST_ENV");
        env::remove_var("EXOQUIC_CFG_TEST_TOKEN_FORMAT");
    }

    #[test]
    fn test_from_env_missing_api_key() {
        let result = AuthorizerConfig::from_env("EXOQUIC_CFG_MISSING");
        assert!(matches!(result, Err(ConfigError::EnvVar(_))));
    }

    #[test]
    fn test_from_env_invalid_token_format() {
        env::set_var("EXOQUIC_CFG_BAD_API_KEY", "env-key");
        env::set_var("EXOQUIC_CFG_BAD_TOKEN_FORMAT", "xml");

        let result = AuthorizerConfig::from_env("EXOQUIC_CFG_BAD");
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        env::remove_var("EXOQUIC_CFG_BAD_API_KEY");
        env::remove_var("EXOQUIC_CFG_BAD_TOKEN_FORMAT");
    }
}
