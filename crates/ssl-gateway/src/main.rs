//! `ssl-gateway` binary.
//!
//! Configuration comes from the TOML file named by `SSL_GATEWAY_CONFIG`
//! (defaults otherwise) plus `SSL_GATEWAY_PORT`,
//! `SSL_TIMESTAMP_EXPIRE_SECONDS` and `SSL_LOG_LEVEL`.
//!
//! On Unix, `SIGHUP` drops the cached RSA keys so a rotated key pair is
//! picked up on the next request.

use anyhow::{Context, Result};
use ssl_gateway::{init_tracing, GatewayConfig, KeyRepository, SslGatewayService};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatewayConfig::load().context("loading gateway configuration")?;
    init_tracing(&config.telemetry)?;

    info!("===========================================");
    info!("  SSL Gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let service = SslGatewayService::new(config)?;
    let listener = service.bind().await?;
    spawn_key_reload(service.keys())?;

    service.run(listener, shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
    }
}

#[cfg(unix)]
fn spawn_key_reload(keys: Arc<dyn KeyRepository>) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup()).context("installing SIGHUP handler")?;
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            info!("Received SIGHUP, reloading RSA keys");
            keys.invalidate();
        }
    });
    Ok(())
}

#[cfg(not(unix))]
fn spawn_key_reload(_keys: Arc<dyn KeyRepository>) -> Result<()> {
    Ok(())
}
