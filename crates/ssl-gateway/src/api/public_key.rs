//! `GET <prefix>/public`: the gateway's RSA public key as PEM text.

use super::ApiState;
use crate::keys::KeyRepositoryError;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

/// Body returned when the store holds no public key
pub const NOT_FOUND_BODY: &str = "not found rsa public key.";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

pub async fn public_key(State(state): State<ApiState>) -> Response {
    match state.keys.public_key().await {
        Ok(pem) => {
            debug!("Serving RSA public key");
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, TEXT_PLAIN)],
                pem.to_string(),
            )
                .into_response()
        }
        Err(KeyRepositoryError::NotFound(key)) => {
            warn!(key = %key, "RSA public key not found");
            (
                StatusCode::NOT_FOUND,
                [(header::CONTENT_TYPE, TEXT_PLAIN)],
                NOT_FOUND_BODY,
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to load RSA public key");
            crate::domain::error::GatewayError::KeyStore(e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::RsaConfig;
    use crate::keys::CachedKeyRepository;
    use crate::middleware::GatewayMetrics;
    use crate::store::{KeyValueStore, MemoryStore, StoreError};
    use async_trait::async_trait;
    use axum::{body::Body, http::Request, routing::get, Router};
    use ssl_crypto::test_keys::GATEWAY_PUBLIC_KEY_PEM;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Http("connection refused".into()))
        }
    }

    fn app(store: Arc<dyn KeyValueStore>) -> Router {
        let state = ApiState {
            keys: Arc::new(CachedKeyRepository::new(store, &RsaConfig::default())),
            metrics: Arc::new(GatewayMetrics::new()),
        };
        Router::new()
            .route("/rsa/public", get(public_key))
            .with_state(state)
    }

    async fn fetch(app: Router) -> (StatusCode, String, String) {
        let response = app
            .oneshot(Request::get("/rsa/public").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .to_string();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_serves_normalized_pem() {
        let store = Arc::new(MemoryStore::default());
        store.insert("rsa/public", format!("  {}  ", GATEWAY_PUBLIC_KEY_PEM.replace('\n', "\\n")));

        let (status, content_type, body) = fetch(app(store)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.starts_with("text/plain"));
        assert_eq!(body, GATEWAY_PUBLIC_KEY_PEM.trim());
    }

    #[tokio::test]
    async fn test_missing_key_is_404() {
        let (status, _, body) = fetch(app(Arc::new(MemoryStore::default()))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, NOT_FOUND_BODY);
    }

    #[tokio::test]
    async fn test_store_failure_is_503() {
        let (status, content_type, _) = fetch(app(Arc::new(BrokenStore))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(content_type, "application/json");
    }
}
