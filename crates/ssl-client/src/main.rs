//! `ssl-client` binary: sends the sample calls through the gateway.
//!
//! `SSL_GATEWAY_ADDRESS` selects the gateway; `SSL_PUBLIC_KEY_FILE` skips
//! fetching its public key.

use anyhow::{Context, Result};
use reqwest::Method;
use ssl_client::{ClientConfig, GatewayClient};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()?;

    let config = ClientConfig::from_env().context("loading client configuration")?;
    let client = GatewayClient::connect(&config)
        .await
        .context("connecting to gateway")?;

    match client
        .send(Method::GET, "sample/api/v1/values/name", None, None)
        .await
    {
        Ok(value) => info!(value = %value, "GET sample/api/v1/values/name"),
        Err(e) => error!(error = %e, "GET sample/api/v1/values/name failed"),
    }

    match client
        .send(
            Method::POST,
            "sample/api/v1/values",
            Some(r#"{"Name":"prefix","Value":10}"#),
            Some("application/json"),
        )
        .await
    {
        Ok(id) => info!(id = %id, "POST sample/api/v1/values"),
        Err(e) => error!(error = %e, "POST sample/api/v1/values failed"),
    }

    Ok(())
}
