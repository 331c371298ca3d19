//! Reverse proxy: forwards requests to the downstream service selected by
//! the route table and copies the response back.

use crate::domain::error::GatewayError;
use crate::middleware::GatewayMetrics;
use crate::routes::RouteTable;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, Request},
    response::Response,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Headers that describe a single connection and are never forwarded.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Proxy state shared by every forwarded request
#[derive(Clone)]
pub struct ProxyState {
    routes: Arc<RouteTable>,
    client: reqwest::Client,
    max_body_bytes: usize,
    metrics: Arc<GatewayMetrics>,
}

impl ProxyState {
    pub fn new(
        routes: Arc<RouteTable>,
        timeout: Duration,
        max_body_bytes: usize,
        metrics: Arc<GatewayMetrics>,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Config(format!("http client: {}", e)))?;
        Ok(Self {
            routes,
            client,
            max_body_bytes,
            metrics,
        })
    }
}

/// Router that forwards every request.
pub fn router(state: ProxyState) -> Router {
    Router::new().fallback(forward).with_state(state)
}

/// Forward one request downstream.
pub async fn forward(
    State(state): State<ProxyState>,
    req: Request<Body>,
) -> Result<Response, GatewayError> {
    let path = req.uri().path().to_string();
    let resolved = state
        .routes
        .resolve(&path)
        .ok_or_else(|| GatewayError::RouteNotFound(path.clone()))?;
    let url = resolved.url(req.uri().query());
    let service = resolved.route.service_name.clone().unwrap_or_default();

    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|_| GatewayError::PayloadTooLarge)?;

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);

    debug!(service = %service, method = %parts.method, url = %url, "Forwarding request");

    let upstream = state
        .client
        .request(parts.method, &url)
        .headers(headers)
        .body(bytes)
        .send()
        .await
        .map_err(|e| {
            state.metrics.record_upstream_error();
            warn!(service = %service, url = %url, error = %e, "Downstream unreachable");
            GatewayError::Upstream(e.to_string())
        })?;

    let status = upstream.status();
    let mut response_headers = upstream.headers().clone();
    strip_hop_by_hop(&mut response_headers);
    response_headers.remove(header::CONTENT_LENGTH);

    let body = read_limited(upstream, state.max_body_bytes)
        .await
        .map_err(|e| {
            state.metrics.record_upstream_error();
            warn!(service = %service, url = %url, error = %e, "Failed to read downstream body");
            e
        })?;

    debug!(service = %service, status = status.as_u16(), "Downstream responded");

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    Ok(response)
}

/// Buffer a downstream body, giving up once it exceeds `limit` bytes.
async fn read_limited(
    mut upstream: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, GatewayError> {
    let too_large = || GatewayError::BadUpstreamResponse(format!("body exceeds {} bytes", limit));

    if upstream
        .content_length()
        .is_some_and(|len| len > limit as u64)
    {
        return Err(too_large());
    }

    let mut body = Vec::new();
    while let Some(chunk) = upstream
        .chunk()
        .await
        .map_err(|e| GatewayError::BadUpstreamResponse(e.to_string()))?
    {
        if body.len() + chunk.len() > limit {
            return Err(too_large());
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Remove hop-by-hop headers, including any named by `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in &named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}
