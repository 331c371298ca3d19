//! Gateway error types and their HTTP rendering.
//!
//! Every error body has the shape `{"error":{"code":..,"message":..}}`.

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use ssl_envelope::EnvelopeError;

/// Error body returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Stable machine-readable code
    pub code: String,
    /// Human-readable description
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Serialize as `{"error": {...}}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "error": self })
    }
}

impl From<&EnvelopeError> for ApiError {
    fn from(e: &EnvelopeError) -> Self {
        ApiError::new(e.kind(), e.to_string())
    }
}

/// Gateway-level errors
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Server stopped with an I/O error
    #[error("server error: {0}")]
    Serve(String),

    /// No route for the request path
    #[error("no route for {0}")]
    RouteNotFound(String),

    /// Body larger than the configured limit
    #[error("payload too large")]
    PayloadTooLarge,

    /// Downstream service could not be reached
    #[error("upstream unreachable: {0}")]
    Upstream(String),

    /// Downstream response could not be processed
    #[error("bad upstream response: {0}")]
    BadUpstreamResponse(String),

    /// Key material could not be read
    #[error("key store unavailable: {0}")]
    KeyStore(String),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Upstream(_) | GatewayError::BadUpstreamResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
            GatewayError::KeyStore(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Config(_)
            | GatewayError::Bind(_)
            | GatewayError::Serve(_)
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Config(_) => "Config",
            GatewayError::Bind(_) => "Bind",
            GatewayError::Serve(_) => "Serve",
            GatewayError::RouteNotFound(_) => "RouteNotFound",
            GatewayError::PayloadTooLarge => "PayloadTooLarge",
            GatewayError::Upstream(_) => "UpstreamUnavailable",
            GatewayError::BadUpstreamResponse(_) => "BadUpstreamResponse",
            GatewayError::KeyStore(_) => "KeyStoreUnavailable",
            GatewayError::Internal(_) => "Internal",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let error = ApiError::new(self.code(), self.to_string());
        json_response(self.status(), &error)
    }
}

/// `401` for a rejected envelope.
pub fn unauthorized_response(error: &EnvelopeError) -> Response {
    let mut response = json_response(StatusCode::UNAUTHORIZED, &ApiError::from(error));
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("X-SSL"));
    response
}

fn json_response(status: StatusCode, error: &ApiError) -> Response {
    let body = serde_json::to_vec(&error.to_json()).unwrap_or_default();
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}
