use chrono::{DateTime, Duration, Utc};

use exoquic_api::{AuthorizeSubscriptionRequest, ResetFrom};

/// Lifetime applied to a token when the caller does not choose an expiry
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 120;

/// Caller-facing subscription parameters
///
/// Unlike [`AuthorizeSubscriptionRequest`], which is sent as-is, these are
/// completed with defaults at the moment of the call: `reset_from` falls back
/// to [`ResetFrom::Earliest`] and `expires_at` to now plus
/// [`DEFAULT_TOKEN_TTL_SECS`].
///
/// ```
/// use exoquic_auth::{ResetFrom, SubscriptionParams};
///
/// let params = SubscriptionParams::new("orders")
///     .channel("eu-west")
///     .subscription_id("dashboard-7")
///     .reset_from(ResetFrom::Latest);
/// assert_eq!(params.topic, "orders");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionParams {
    pub topic: String,
    pub channel: Option<String>,
    pub subscription_id: Option<String>,
    pub reset_from: Option<ResetFrom>,
    /// Unix seconds
    pub expires_at: Option<i64>,
}

impl SubscriptionParams {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            channel: None,
            subscription_id: None,
            reset_from: None,
            expires_at: None,
        }
    }

    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn subscription_id(mut self, subscription_id: impl Into<String>) -> Self {
        self.subscription_id = Some(subscription_id.into());
        self
    }

    pub fn reset_from(mut self, reset_from: ResetFrom) -> Self {
        self.reset_from = Some(reset_from);
        self
    }

    pub fn expires_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set the expiry relative to the current time
    pub fn expires_in(self, ttl: Duration) -> Self {
        let expires_at = (Utc::now() + ttl).timestamp();
        self.expires_at(expires_at)
    }

    /// Complete the parameters with defaults computed from the current time
    pub fn into_request(self) -> AuthorizeSubscriptionRequest {
        self.into_request_at(Utc::now())
    }

    /// Complete the parameters with defaults computed from `now`
    pub fn into_request_at(self, now: DateTime<Utc>) -> AuthorizeSubscriptionRequest {
        let expires_at = self
            .expires_at
            .unwrap_or_else(|| (now + Duration::seconds(DEFAULT_TOKEN_TTL_SECS)).timestamp());

        AuthorizeSubscriptionRequest {
            topic: self.topic,
            channel: self.channel,
            subscription_id: self.subscription_id,
            reset_from: Some(self.reset_from.unwrap_or_default()),
            expires_at: Some(expires_at),
        }
    }
}

impl From<&str> for SubscriptionParams {
    fn from(topic: &str) -> Self {
        Self::new(topic)
    }
}

impl From<String> for SubscriptionParams {
    fn from(topic: String) -> Self {
        Self::new(topic)
    }
}
