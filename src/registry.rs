use std::sync::{Arc, PoisonError, RwLock};

use exoquic_api::{AuthorizerConfig, SubscriptionAuthorizer};
use exoquic_config::try_load_default_config;
use tracing::{debug, info};

use crate::{AuthorizerOptions, SdkError, SubscriptionParams};

/// Holder for the authorizer used by the free-function API
///
/// A registry holds at most one [`SubscriptionAuthorizer`]. Initializing it
/// again replaces the instance; calls already in flight keep the authorizer
/// they started with. Code that prefers explicit wiring can own a registry
/// (or just an authorizer) instead of going through [`default_registry`].
#[derive(Debug, Default)]
pub struct AuthorizerRegistry {
    current: RwLock<Option<Arc<SubscriptionAuthorizer>>>,
}

impl AuthorizerRegistry {
    pub const fn new() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }

    /// Build an authorizer from init options and install it
    pub fn init(&self, options: AuthorizerOptions) -> Result<(), SdkError> {
        let authorizer = options.into_authorizer()?;
        self.set(authorizer);
        Ok(())
    }

    /// Build an authorizer from a configuration and install it
    pub fn init_from_config(&self, config: &AuthorizerConfig) -> Result<(), SdkError> {
        let authorizer = SubscriptionAuthorizer::from_config(config)?;
        self.set(authorizer);
        Ok(())
    }

    /// Install an already constructed authorizer; the last call wins
    pub fn set(&self, authorizer: SubscriptionAuthorizer) {
        info!(server_url = %authorizer.server_url(), "subscription authorizer initialized");
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if current.replace(Arc::new(authorizer)).is_some() {
            debug!("replaced previously initialized subscription authorizer");
        }
    }

    /// The installed authorizer
    ///
    /// # Errors
    ///
    /// Returns `SdkError::NotInitialized` if nothing has been installed yet
    pub fn get(&self) -> Result<Arc<SubscriptionAuthorizer>, SdkError> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(SdkError::NotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Remove the installed authorizer
    pub fn clear(&self) {
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Apply call-time defaults and authorize through the installed authorizer
    pub async fn authorize(
        &self,
        params: impl Into<SubscriptionParams>,
    ) -> Result<String, SdkError> {
        let authorizer = self.get()?;
        let request = params.into().into_request();
        Ok(authorizer.authorize(&request).await?)
    }
}

static DEFAULT_REGISTRY: AuthorizerRegistry = AuthorizerRegistry::new();

/// The process-wide registry behind the free functions
pub fn default_registry() -> &'static AuthorizerRegistry {
    &DEFAULT_REGISTRY
}

/// Initialize the process-wide authorizer
///
/// Calling this again replaces the previous authorizer.
///
/// # Example
///
/// ```no_run
/// use exoquic_auth::{authorize_subscription, init_subscription_authorizer, AuthorizerOptions};
///
/// # async fn example() -> Result<(), exoquic_auth::SdkError> {
/// init_subscription_authorizer(AuthorizerOptions::new("my-api-key").env("prod"))?;
///
/// let token = authorize_subscription("orders").await?;
/// # Ok(())
/// # }
/// ```
pub fn init_subscription_authorizer(options: AuthorizerOptions) -> Result<(), SdkError> {
    DEFAULT_REGISTRY.init(options)
}

/// Initialize the process-wide authorizer from the standard config locations
///
/// See [`exoquic_config::try_load_default_config`] for the search order.
pub fn init_from_default_config() -> Result<(), SdkError> {
    let config = try_load_default_config().ok_or(SdkError::ConfigNotFound)?;
    DEFAULT_REGISTRY.init_from_config(&config)
}

/// Authorize a subscription through the process-wide authorizer
///
/// Missing `reset_from` and `expires_at` are filled in fresh for each call.
///
/// # Errors
///
/// - `SdkError::NotInitialized` before [`init_subscription_authorizer`] was called
/// - `SdkError::Authorization` for any failure of the exchange itself
pub async fn authorize_subscription(
    params: impl Into<SubscriptionParams>,
) -> Result<String, SdkError> {
    DEFAULT_REGISTRY.authorize(params).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_is_empty() {
        let registry = AuthorizerRegistry::new();
        assert!(!registry.is_initialized());
        assert!(matches!(registry.get(), Err(SdkError::NotInitialized)));
    }

    #[test]
    fn test_last_init_wins() {
        let registry = AuthorizerRegistry::new();
        registry
            .init(AuthorizerOptions::new("first").server_url("http://first.local"))
            .unwrap();
        registry
            .init(AuthorizerOptions::new("second").server_url("http://second.local"))
            .unwrap();

        assert_eq!(registry.get().unwrap().server_url(), "http://second.local");
    }

    #[test]
    fn test_replacing_keeps_handles_alive() {
        let registry = AuthorizerRegistry::new();
        registry.set(SubscriptionAuthorizer::new("k", Some("http://old.local".into())));
        let held = registry.get().unwrap();

        registry.set(SubscriptionAuthorizer::new("k", Some("http://new.local".into())));
        assert_eq!(held.server_url(), "http://old.local");
        assert_eq!(registry.get().unwrap().server_url(), "http://new.local");
    }

    #[test]
    fn test_clear() {
        let registry = AuthorizerRegistry::new();
        registry.init(AuthorizerOptions::new("k").env("prod")).unwrap();
        assert!(registry.is_initialized());

        registry.clear();
        assert!(!registry.is_initialized());
    }

    #[test]
    fn test_init_rejects_empty_api_key() {
        let registry = AuthorizerRegistry::new();
        let result = registry.init(AuthorizerOptions::new(""));
        assert!(matches!(result, Err(SdkError::Config(_))));
        assert!(!registry.is_initialized());
    }

    #[tokio::test]
    async fn test_authorize_before_init_fails_explicitly() {
        let registry = AuthorizerRegistry::new();
        let err = registry.authorize("orders").await.unwrap_err();
        assert!(matches!(err, SdkError::NotInitialized));
        assert_eq!(err.status_code(), None);
    }
}
