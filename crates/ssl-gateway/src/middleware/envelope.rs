//! Envelope validation middleware.
//!
//! For guarded routes: check headers and timestamp, unwrap the per-request
//! secrets with the gateway's RSA private key, verify the request signature,
//! decrypt the body and strip the envelope headers before forwarding. On the
//! way back every response is stamped with a fresh timestamp and signature,
//! and successful responses are encrypted with the request's session key.
//!
//! Any failure before forwarding short-circuits with `401` and the inner
//! service is never called. Unguarded routes bypass the pipeline.

use crate::domain::error::{unauthorized_response, GatewayError};
use crate::keys::KeyRepository;
use crate::middleware::metrics::{GatewayMetrics, RequestTimer};
use crate::routes::RouteGuard;
use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue, Request},
    response::{IntoResponse, Response},
};
use ssl_envelope::{EnvelopeError, EnvelopeOpener, ExchangeSecrets};
use std::sync::Arc;
use tower::{Layer, Service};
use tracing::{debug, error, info_span, warn, Instrument};

/// Default request body limit (1MB)
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
struct EnvelopeState {
    opener: EnvelopeOpener,
    keys: Arc<dyn KeyRepository>,
    guard: Arc<dyn RouteGuard>,
    metrics: Arc<GatewayMetrics>,
    max_body_bytes: usize,
}

/// Envelope layer
#[derive(Clone)]
pub struct EnvelopeLayer {
    state: Arc<EnvelopeState>,
}

impl EnvelopeLayer {
    pub fn new(
        opener: EnvelopeOpener,
        keys: Arc<dyn KeyRepository>,
        guard: Arc<dyn RouteGuard>,
    ) -> Self {
        Self {
            state: Arc::new(EnvelopeState {
                opener,
                keys,
                guard,
                metrics: Arc::new(GatewayMetrics::new()),
                max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            }),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<GatewayMetrics>) -> Self {
        Arc::make_mut(&mut self.state).metrics = metrics;
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        Arc::make_mut(&mut self.state).max_body_bytes = max_body_bytes;
        self
    }

    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.state.metrics)
    }
}

impl<S> Layer<S> for EnvelopeLayer {
    type Service = EnvelopeValidator<S>;

    fn layer(&self, inner: S) -> Self::Service {
        EnvelopeValidator {
            inner,
            state: Arc::clone(&self.state),
        }
    }
}

/// Envelope validation service
#[derive(Clone)]
pub struct EnvelopeValidator<S> {
    inner: S,
    state: Arc<EnvelopeState>,
}

impl<S> Service<Request<Body>> for EnvelopeValidator<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let state = Arc::clone(&self.state);
        let mut inner = self.inner.clone();

        if !state.guard.is_guarded(req.uri().path()) {
            state.metrics.record_bypass();
            return Box::pin(async move { inner.call(req).await });
        }

        let span = info_span!(
            "envelope",
            method = %req.method(),
            path = %req.uri().path(),
        );

        Box::pin(
            async move {
                let timer = RequestTimer::new(Arc::clone(&state.metrics));

                let (req, secrets) = match open_request(&state, req).await {
                    Ok(opened) => opened,
                    Err(rejection) => return Ok(rejection),
                };
                state.metrics.record_accepted();

                let response = inner.call(req).await?;

                let (response, encrypted) = seal_response(&state, response, &secrets).await;
                timer.finish(encrypted);
                Ok(response)
            }
            .instrument(span),
        )
    }
}

/// Steps up to forwarding. The error side is the response to send instead.
async fn open_request(
    state: &EnvelopeState,
    req: Request<Body>,
) -> Result<(Request<Body>, ExchangeSecrets), Response> {
    let reject = |error: EnvelopeError| {
        warn!(reason = error.kind(), error = %error, "Request rejected");
        state.metrics.record_rejection(&error);
        unauthorized_response(&error)
    };

    let envelope = state.opener.inspect(req.headers()).map_err(&reject)?;

    let private_key = match state.keys.private_key().await {
        Ok(key) => key,
        Err(e) => {
            warn!(error = %e, "RSA private key unavailable");
            return Err(reject(EnvelopeError::KeyUnavailable));
        }
    };

    let path = req.uri().path().to_string();
    let secrets = state
        .opener
        .unwrap_secrets(&private_key, req.method(), &path, &envelope)
        .map_err(&reject)?;

    let (mut parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|e| {
            warn!(error = %e, limit = state.max_body_bytes, "Request body rejected");
            GatewayError::PayloadTooLarge.into_response()
        })?;

    let body = if is_blank(&bytes) {
        Body::from(bytes)
    } else {
        let text = std::str::from_utf8(&bytes)
            .map_err(|_| reject(EnvelopeError::DecryptionFailure))?;
        let plaintext = state
            .opener
            .open_body(&secrets, text)
            .map_err(&reject)?;
        parts
            .headers
            .insert(header::CONTENT_LENGTH, HeaderValue::from(plaintext.len()));
        Body::from(plaintext)
    };

    state.opener.strip_headers(&mut parts.headers);
    debug!("Envelope opened");

    Ok((Request::from_parts(parts, body), secrets))
}

/// Sign every response; encrypt successful ones. Returns whether the body
/// was encrypted.
async fn seal_response(
    state: &EnvelopeState,
    response: Response,
    secrets: &ExchangeSecrets,
) -> (Response, bool) {
    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            state.metrics.record_upstream_error();
            let error = GatewayError::BadUpstreamResponse(e.to_string());
            return (signed_error(state, error, secrets), false);
        }
    };

    let status = parts.status;
    let text = if status.is_success() {
        match std::str::from_utf8(&bytes) {
            Ok(text) => text,
            Err(_) => {
                state.metrics.record_upstream_error();
                let error = GatewayError::BadUpstreamResponse("body is not UTF-8 text".into());
                return (signed_error(state, error, secrets), false);
            }
        }
    } else {
        ""
    };

    match state
        .opener
        .seal_response(status, &mut parts.headers, text, secrets)
    {
        Ok(Some(sealed)) => {
            parts
                .headers
                .insert(header::CONTENT_LENGTH, HeaderValue::from(sealed.len()));
            debug!(status = status.as_u16(), "Response encrypted");
            (Response::from_parts(parts, Body::from(sealed)), true)
        }
        Ok(None) => {
            debug!(status = status.as_u16(), "Response signed, body passed through");
            (Response::from_parts(parts, Body::from(bytes)), false)
        }
        Err(e) => {
            error!(error = %e, "Failed to seal response");
            (GatewayError::Internal(e.to_string()).into_response(), false)
        }
    }
}

fn signed_error(state: &EnvelopeState, error: GatewayError, secrets: &ExchangeSecrets) -> Response {
    warn!(error = %error, "Replacing upstream response");
    let mut response = error.into_response();
    let status = response.status();
    if let Err(e) = state
        .opener
        .seal_response(status, response.headers_mut(), "", secrets)
    {
        error!(error = %e, "Failed to sign error response");
    }
    response
}

fn is_blank(bytes: &Bytes) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}
