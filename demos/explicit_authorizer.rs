use exoquic_auth::{AuthorizerConfig, SdkError, SubscriptionAuthorizer, SubscriptionParams};
use std::sync::Arc;

/// Application state carrying the authorizer instead of a global
struct AppState {
    authorizer: Arc<SubscriptionAuthorizer>,
}

async fn token_for_user(state: &AppState, user_id: &str) -> Result<String, SdkError> {
    let request = SubscriptionParams::new("notifications")
        .channel(format!("user-{}", user_id))
        .into_request();
    Ok(state.authorizer.authorize(&request).await?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AuthorizerConfig::from_env("EXOQUIC")?;
    let state = AppState {
        authorizer: Arc::new(SubscriptionAuthorizer::from_config(&config)?),
    };

    match token_for_user(&state, "42").await {
        Ok(token) => println!("Access token: {}", token),
        Err(e) => eprintln!("Authorization failed ({:?}): {}", e.status_code(), e),
    }
    Ok(())
}
