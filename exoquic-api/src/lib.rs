//! # Exoquic API
//!
//! HTTP client for the Exoquic subscription authorization endpoint.
//!
//! A backend holds the organization's API key and exchanges it, together with
//! subscription parameters, for a short-lived access token that an end-user
//! client can present when it subscribes. This crate performs that single
//! exchange:
//!
//! - `POST {serverUrl}/authorize-subscription`
//! - headers `Content-Type: application/json` and `x-api-key`
//! - a JSON body with `topic`, `channel`, `subscriptionId`, `resetFrom`, `expiresAt`
//!
//! Every failure is reported as an [`AuthorizationError`] carrying a status code.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub use exoquic_config::{AuthorizerConfig, ConfigError, TokenFormat};

/// Path of the authorization endpoint, relative to the server base URL
pub const AUTHORIZE_SUBSCRIPTION_PATH: &str = "authorize-subscription";

/// Prefix of every [`AuthorizationError`] message
pub const ERROR_PREFIX: &str = "Failed to authorize subscription: ";

/// Status code reported when no HTTP status is available
pub const INTERNAL_ERROR_STATUS: u16 = 500;

/// The single classified error for authorization failures
///
/// `status_code` is the status returned by the service when it rejected the
/// request, or 500 when the request never produced a usable response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AuthorizationError {
    pub message: String,
    pub status_code: u16,
}

impl AuthorizationError {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code,
        }
    }

    /// The service answered with a non-success status
    pub fn rejected(status_code: u16, body: &str) -> Self {
        Self::new(status_code, format!("{}{}", ERROR_PREFIX, body))
    }

    /// The request could not complete (DNS, connect, body read, ...)
    pub fn transport(cause: impl fmt::Display) -> Self {
        Self::new(INTERNAL_ERROR_STATUS, format!("{}{}", ERROR_PREFIX, cause))
    }

    /// The service answered with success but the body was unusable
    pub fn invalid_response(cause: impl fmt::Display) -> Self {
        Self::new(
            INTERNAL_ERROR_STATUS,
            format!("{}invalid response: {}", ERROR_PREFIX, cause),
        )
    }
}

/// Fallback position when a subscription ID's resume point is missing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetFrom {
    #[default]
    Earliest,
    Latest,
}

/// Request payload for authorizing a subscription
///
/// Optional fields left as `None` are omitted from the JSON body, which the
/// service treats the same as not provided.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeSubscriptionRequest {
    /// The topic to subscribe to
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Identifier to resume a previous subscription from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_from: Option<ResetFrom>,
    /// Token expiry as unix seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl AuthorizeSubscriptionRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            channel: None,
            subscription_id: None,
            reset_from: None,
            expires_at: None,
        }
    }
}

/// Success body under [`TokenFormat::JsonAccessToken`]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Exchanges an API key and subscription parameters for an access token
///
/// The authorizer is immutable after construction and holds no per-call
/// state, so one instance can serve any number of concurrent calls.
#[derive(Clone)]
pub struct SubscriptionAuthorizer {
    api_key: String,
    server_url: String,
    token_format: TokenFormat,
    client: reqwest::Client,
}

impl fmt::Debug for SubscriptionAuthorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionAuthorizer")
            .field("api_key", &"<redacted>")
            .field("server_url", &self.server_url)
            .field("token_format", &self.token_format)
            .finish()
    }
}

impl SubscriptionAuthorizer {
    /// Create an authorizer; without a server URL the environment default is used
    pub fn new(api_key: impl Into<String>, server_url: Option<String>) -> Self {
        let server_url = exoquic_config::resolve_server_url(
            server_url.as_deref(),
            None,
            std::env::var(exoquic_config::ENV_VAR).ok().as_deref(),
        );

        Self {
            api_key: api_key.into(),
            server_url,
            token_format: TokenFormat::default(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a validated authorizer from a configuration
    pub fn from_config(config: &AuthorizerConfig) -> Result<Self, ConfigError> {
        Self::builder().from_config(config).build()
    }

    pub fn builder() -> SubscriptionAuthorizerBuilder {
        SubscriptionAuthorizerBuilder::new()
    }

    /// The server base URL requests are sent to
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Full URL of the authorization endpoint
    pub fn endpoint_url(&self) -> String {
        format!("{}/{}", self.server_url, AUTHORIZE_SUBSCRIPTION_PATH)
    }

    pub fn token_format(&self) -> TokenFormat {
        self.token_format
    }

    /// Request an access token for a subscription
    ///
    /// Sends exactly one request; nothing is retried or cached. No local
    /// validation is done beyond what the type system enforces, the service
    /// is the authority on whether the parameters make sense.
    ///
    /// # Errors
    ///
    /// - the service's status code and body when it rejects the request
    /// - status 500 when the request fails in transport or the body can't be read
    #[instrument(
        skip(self, request),
        fields(topic = %request.topic, channel = ?request.channel, server_url = %self.server_url)
    )]
    pub async fn authorize(
        &self,
        request: &AuthorizeSubscriptionRequest,
    ) -> Result<String, AuthorizationError> {
        let response = self
            .client
            .post(self.endpoint_url())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header("x-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "authorization request failed in transport");
                AuthorizationError::transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "authorization rejected by service");
            return Err(AuthorizationError::rejected(status.as_u16(), &error_text));
        }

        let body = response
            .text()
            .await
            .map_err(AuthorizationError::transport)?;

        let token = match self.token_format {
            TokenFormat::PlainText => body,
            TokenFormat::JsonAccessToken => {
                serde_json::from_str::<AccessTokenResponse>(&body)
                    .map_err(AuthorizationError::invalid_response)?
                    .access_token
            }
        };

        debug!(status = status.as_u16(), "subscription authorized");
        Ok(token)
    }
}

/// Builder for creating subscription authorizers
#[derive(Default)]
pub struct SubscriptionAuthorizerBuilder {
    config: Option<AuthorizerConfig>,
    api_key: Option<String>,
    env: Option<String>,
    server_url: Option<String>,
    token_format: Option<TokenFormat>,
    client: Option<reqwest::Client>,
}

impl SubscriptionAuthorizerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a configuration; individual setters still override it
    pub fn from_config(mut self, config: &AuthorizerConfig) -> Self {
        self.config = Some(config.clone());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the deployment environment tag used to derive the server URL
    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    pub fn server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = Some(server_url.into());
        self
    }

    pub fn token_format(mut self, token_format: TokenFormat) -> Self {
        self.token_format = Some(token_format);
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies, TLS roots)
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    fn into_config(self) -> (AuthorizerConfig, Option<reqwest::Client>) {
        let mut config = self
            .config
            .unwrap_or_else(|| AuthorizerConfig::new(String::new()));

        if let Some(api_key) = self.api_key {
            config.api_key = api_key;
        }
        if let Some(env) = self.env {
            config.env = Some(env);
        }
        if let Some(server_url) = self.server_url {
            config.server_url = Some(server_url);
        }
        if let Some(token_format) = self.token_format {
            config.token_format = token_format;
        }

        (config, self.client)
    }

    /// Build the authorizer
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the server URL is invalid
    pub fn build(self) -> Result<SubscriptionAuthorizer, ConfigError> {
        let (config, client) = self.into_config();
        config.validate()?;

        Ok(SubscriptionAuthorizer {
            server_url: config.resolved_server_url(),
            api_key: config.api_key,
            token_format: config.token_format,
            client: client.unwrap_or_default(),
        })
    }
}
