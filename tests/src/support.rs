//! Sample backend and gateway harness.
//!
//! Both servers bind ephemeral loopback ports and stop when their handle is
//! dropped.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use ssl_client::{ClientConfig, GatewayClient};
use ssl_crypto::test_keys::{GATEWAY_PRIVATE_KEY_PEM, GATEWAY_PUBLIC_KEY_PEM};
use ssl_gateway::{
    GatewayConfig, GatewayMetrics, MemoryStore, RouteConfig, SslGatewayService,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// What the backend saw of the last request
#[derive(Debug, Clone, Default)]
pub struct SeenRequest {
    pub body: String,
    pub content_type: Option<String>,
    pub envelope_headers: usize,
}

#[derive(Clone, Default)]
struct BackendState {
    hits: Arc<AtomicUsize>,
    last: Arc<Mutex<Option<SeenRequest>>>,
}

impl BackendState {
    fn record(&self, headers: &HeaderMap, body: String) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        *self.last.lock() = Some(SeenRequest {
            body,
            content_type: headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            envelope_headers: headers
                .keys()
                .filter(|name| name.as_str().starts_with("x-ssl-"))
                .count(),
        });
    }
}

/// Sample API behind the gateway.
///
/// - `POST /api/v1/values` → `"id-value"`
/// - `GET /api/v1/values/{name}` → `"value:{name}"`
/// - `GET /api/v1/fail` → `500 backend exploded`
/// - `GET /public/ping` → `pong`
pub struct SampleBackend {
    pub addr: SocketAddr,
    state: BackendState,
    shutdown: Option<oneshot::Sender<()>>,
}

impl SampleBackend {
    pub async fn spawn() -> anyhow::Result<Self> {
        let state = BackendState::default();
        let app = Router::new()
            .route("/api/v1/values", post(add_value))
            .route("/api/v1/values/:name", get(get_value))
            .route("/api/v1/fail", get(fail))
            .route("/public/ping", get(ping))
            .with_state(state.clone());

        let (addr, shutdown) = serve(app).await?;
        Ok(Self {
            addr,
            state,
            shutdown: Some(shutdown),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<SeenRequest> {
        self.state.last.lock().clone()
    }
}

impl Drop for SampleBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn add_value(
    State(state): State<BackendState>,
    headers: HeaderMap,
    body: String,
) -> Json<&'static str> {
    state.record(&headers, body);
    Json("id-value")
}

async fn get_value(
    State(state): State<BackendState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Json<String> {
    state.record(&headers, String::new());
    Json(format!("value:{}", name))
}

async fn fail(State(state): State<BackendState>, headers: HeaderMap) -> (StatusCode, &'static str) {
    state.record(&headers, String::new());
    (StatusCode::INTERNAL_SERVER_ERROR, "backend exploded")
}

async fn ping(State(state): State<BackendState>, headers: HeaderMap) -> &'static str {
    state.record(&headers, String::new());
    "pong"
}

/// Gateway in front of a [`SampleBackend`].
///
/// `/sample/api` is guarded and rewritten to `/api`; `/sample/public` is
/// forwarded without an envelope.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub metrics: Arc<GatewayMetrics>,
    pub store: Arc<MemoryStore>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestGateway {
    /// Gateway whose store holds the fixture key pair.
    pub async fn spawn(backend: &SampleBackend) -> anyhow::Result<Self> {
        let store = Arc::new(MemoryStore::default());
        store.insert("rsa/private", GATEWAY_PRIVATE_KEY_PEM);
        store.insert("rsa/public", GATEWAY_PUBLIC_KEY_PEM);
        Self::spawn_with_store(backend, store).await
    }

    pub async fn spawn_with_store(
        backend: &SampleBackend,
        store: Arc<MemoryStore>,
    ) -> anyhow::Result<Self> {
        let config = GatewayConfig {
            routes: vec![
                RouteConfig {
                    upstream_path_prefix: "/sample/api".into(),
                    downstream_base_url: backend.base_url(),
                    downstream_path_prefix: "/api".into(),
                    service_name: Some("sample".into()),
                },
                RouteConfig {
                    upstream_path_prefix: "/sample/public".into(),
                    downstream_base_url: backend.base_url(),
                    downstream_path_prefix: "/public".into(),
                    service_name: Some("sample".into()),
                },
            ],
            ..GatewayConfig::default()
        };

        let service = SslGatewayService::with_store(config, store.clone())?;
        let metrics = service.metrics();
        let router = service.router()?;
        let (addr, shutdown) = serve(router).await?;

        Ok(Self {
            addr,
            metrics,
            store,
            shutdown: Some(shutdown),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            gateway_address: self.base_url(),
            ..ClientConfig::default()
        }
    }

    /// Client that fetches the public key from this gateway.
    pub async fn client(&self) -> anyhow::Result<GatewayClient> {
        Ok(GatewayClient::connect(&self.client_config()).await?)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn serve(app: Router) -> anyhow::Result<(SocketAddr, oneshot::Sender<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = rx.await;
            })
            .await;
    });
    Ok((addr, tx))
}
