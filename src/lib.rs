//! # Exoquic Auth
//!
//! Backend helper for issuing Exoquic subscription access tokens.
//!
//! Your backend keeps the organization's API key. When an end-user client
//! wants to subscribe to a topic, the backend exchanges the key and the
//! subscription parameters for a short-lived signed access token and hands
//! only that token to the client.
//!
//! This crate combines functionality from:
//! - `exoquic-config`: server URL resolution and configuration loading
//! - `exoquic-api`: the HTTP exchange with the authorization endpoint
//!
//! ## Explicit authorizer
//!
//! ```no_run
//! use exoquic_auth::{SubscriptionAuthorizer, SubscriptionParams};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let authorizer = SubscriptionAuthorizer::builder()
//!     .api_key("my-api-key")
//!     .env("prod")
//!     .build()?;
//!
//! let request = SubscriptionParams::new("orders").channel("eu").into_request();
//! let token = authorizer.authorize(&request).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Process-wide convenience functions
//!
//! ```no_run
//! use exoquic_auth::{authorize_subscription, init_subscription_authorizer};
//! use exoquic_auth::{AuthorizerOptions, ResetFrom, SubscriptionParams};
//!
//! # async fn example() -> Result<(), exoquic_auth::SdkError> {
//! init_subscription_authorizer(AuthorizerOptions::new("my-api-key"))?;
//!
//! let token = authorize_subscription(
//!     SubscriptionParams::new("orders")
//!         .subscription_id("dashboard-7")
//!         .reset_from(ResetFrom::Latest),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

mod params;
mod registry;

pub use exoquic_config::{
    resolve_env, resolve_server_url, server_url_for_env, try_load_default_config,
    AuthorizerConfig, AuthorizerConfigBuilder, ConfigError, TokenFormat, DEFAULT_ENV, ENV_VAR,
};

pub use exoquic_api::{
    AccessTokenResponse, AuthorizationError, AuthorizeSubscriptionRequest, ResetFrom,
    SubscriptionAuthorizer, SubscriptionAuthorizerBuilder, AUTHORIZE_SUBSCRIPTION_PATH,
    ERROR_PREFIX,
};

pub use params::{SubscriptionParams, DEFAULT_TOKEN_TTL_SECS};
pub use registry::{
    authorize_subscription, default_registry, init_from_default_config,
    init_subscription_authorizer, AuthorizerRegistry,
};

/// Errors that can occur in the Exoquic auth SDK
#[derive(Error, Debug)]
pub enum SdkError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The authorization exchange failed
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    /// The convenience API was used before an authorizer was installed
    #[error("Subscription authorizer not initialized. Call init_subscription_authorizer() first.")]
    NotInitialized,

    /// No configuration was found in any of the standard locations
    #[error("No Exoquic configuration found in the environment or standard config files")]
    ConfigNotFound,
}

impl SdkError {
    /// HTTP-style status code for authorization failures
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SdkError::Authorization(e) => Some(e.status_code),
            _ => None,
        }
    }
}

/// Options for initializing an authorizer
///
/// The server URL is resolved as: explicit `server_url`, then `env`, then the
/// `EXOQUIC_ENV` environment variable, then the `dev` tier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthorizerOptions {
    pub api_key: String,
    pub env: Option<String>,
    pub server_url: Option<String>,
}

impl AuthorizerOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            env: None,
            server_url: None,
        }
    }

    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    pub fn server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = Some(server_url.into());
        self
    }

    /// Build the authorizer these options describe
    pub fn into_authorizer(self) -> Result<SubscriptionAuthorizer, ConfigError> {
        let mut builder = SubscriptionAuthorizer::builder().api_key(self.api_key);
        if let Some(env) = self.env {
            builder = builder.env(env);
        }
        if let Some(server_url) = self.server_url {
            builder = builder.server_url(server_url);
        }
        builder.build()
    }
}

impl From<AuthorizerConfig> for AuthorizerOptions {
    fn from(config: AuthorizerConfig) -> Self {
        Self {
            api_key: config.api_key,
            env: config.env,
            server_url: config.server_url,
        }
    }
}
