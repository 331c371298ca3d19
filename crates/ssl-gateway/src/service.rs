//! Gateway service: wires the key repository, envelope layer, proxy and
//! plain endpoints into one router and serves it.

use crate::api::{health_check, public_key, ApiState};
use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::keys::{CachedKeyRepository, KeyRepository};
use crate::middleware::{EnvelopeLayer, GatewayMetrics};
use crate::proxy::{self, ProxyState};
use crate::routes::{RouteGuard, RouteTable};
use crate::store::{self, KeyValueStore};
use axum::{routing::get, Router};
use ssl_envelope::EnvelopeOpener;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// SSL gateway service
pub struct SslGatewayService {
    config: GatewayConfig,
    keys: Arc<dyn KeyRepository>,
    routes: Arc<RouteTable>,
    metrics: Arc<GatewayMetrics>,
}

impl SslGatewayService {
    /// Create the service with the store named in the config.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let store = store::from_config(&config.store, config.http.upstream_timeout)
            .map_err(|e| GatewayError::KeyStore(e.to_string()))?;
        Self::with_store(config, store)
    }

    /// Create the service over an explicit key-value store.
    pub fn with_store(
        config: GatewayConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        let keys: Arc<dyn KeyRepository> = Arc::new(CachedKeyRepository::new(store, &config.rsa));
        let routes = Arc::new(RouteTable::new(
            &config.routes,
            &config.envelope.guarded_path_prefix,
        ));

        Ok(Self {
            config,
            keys,
            routes,
            metrics: Arc::new(GatewayMetrics::new()),
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn keys(&self) -> Arc<dyn KeyRepository> {
        Arc::clone(&self.keys)
    }

    /// Build the HTTP router.
    ///
    /// The public key endpoint and `/health` are matched first; everything
    /// else goes through the envelope layer into the proxy.
    pub fn router(&self) -> Result<Router, GatewayError> {
        let proxy_state = ProxyState::new(
            Arc::clone(&self.routes),
            self.config.http.upstream_timeout,
            self.config.http.max_body_bytes,
            Arc::clone(&self.metrics),
        )?;

        let guard: Arc<dyn RouteGuard> = self.routes.clone();
        let envelope = EnvelopeLayer::new(
            EnvelopeOpener::new(self.config.envelope_config()),
            Arc::clone(&self.keys),
            guard,
        )
        .with_metrics(Arc::clone(&self.metrics))
        .with_max_body_bytes(self.config.http.max_body_bytes);

        let proxied = proxy::router(proxy_state).layer(envelope);

        let api_state = ApiState {
            keys: Arc::clone(&self.keys),
            metrics: Arc::clone(&self.metrics),
        };

        Ok(Router::new()
            .route(&self.config.public_key_path(), get(public_key))
            .route("/health", get(health_check))
            .with_state(api_state)
            .fallback_service(proxied)
            .layer(TraceLayer::new_for_http()))
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, GatewayError> {
        let addr = self.config.http_addr();
        TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{}: {}", addr, e)))
    }

    /// Serve on `listener` until `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router()?;
        let addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Bind(e.to_string()))?;

        info!(
            addr = %addr,
            routes = self.routes.routes().len(),
            guarded = self.routes.routes().iter().filter(|r| r.is_guarded()).count(),
            public_key_path = %self.config.public_key_path(),
            "SSL gateway listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| GatewayError::Serve(e.to_string()))?;

        info!("SSL gateway stopped");
        Ok(())
    }
}
