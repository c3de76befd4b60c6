use exoquic_auth::{
    authorize_subscription, init_subscription_authorizer, AuthorizerOptions, ResetFrom,
    SubscriptionParams,
};
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let api_key = std::env::var("EXOQUIC_API_KEY")?;

    // Once at startup
    init_subscription_authorizer(AuthorizerOptions::new(api_key))?;

    // Per end-user request
    let token = authorize_subscription(
        SubscriptionParams::new("orders")
            .channel("eu-west")
            .subscription_id("dashboard-7")
            .reset_from(ResetFrom::Latest),
    )
    .await?;

    println!("Access token: {}", token);
    Ok(())
}
