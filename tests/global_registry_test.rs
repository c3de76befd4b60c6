//! The process-wide registry is shared by every test in a binary, so all of
//! its behavior is exercised from a single test here.

use exoquic_auth::{
    authorize_subscription, default_registry, init_subscription_authorizer, AuthorizerOptions,
    SdkError, SubscriptionParams,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_global_init_and_authorize() {
    let err = authorize_subscription("orders").await.unwrap_err();
    assert!(matches!(err, SdkError::NotInitialized));

    // Without a server URL or env the process environment decides the tier
    init_subscription_authorizer(AuthorizerOptions::new("k")).unwrap();
    let env_tag = std::env::var(exoquic_auth::ENV_VAR).ok();
    assert_eq!(
        default_registry().get().unwrap().server_url(),
        exoquic_auth::resolve_server_url(None, None, env_tag.as_deref())
    );

    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/authorize-subscription"))
        .and(header("x-api-key", "k"))
        .respond_with(ResponseTemplate::new(200).set_body_string("global-token"))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Re-initializing replaces the instance
    init_subscription_authorizer(AuthorizerOptions::new("k").server_url(mock_server.uri()))
        .unwrap();

    let token = authorize_subscription(SubscriptionParams::new("t")).await.unwrap();
    assert_eq!(token, "global-token");

    default_registry().clear();
    assert!(matches!(
        authorize_subscription("t").await,
        Err(SdkError::NotInitialized)
    ));
}
