//! # Client → Gateway → Backend Flows
//!
//! The `ssl-client` transport talks to a live gateway, which forwards to the
//! sample backend:
//!
//! 1. Public key fetched from `/rsa/public`
//! 2. Request sealed, sent, opened and forwarded in plaintext
//! 3. Response sealed by the gateway and opened by the client
//! 4. Backend errors come back signed but legible

#[cfg(test)]
mod tests {
    use crate::support::{SampleBackend, TestGateway};
    use reqwest::{Method, StatusCode};
    use ssl_client::{ClientError, GatewayClient};
    use ssl_crypto::test_keys::GATEWAY_PUBLIC_KEY_PEM;
    use ssl_envelope::EnvelopeError;
    use std::sync::atomic::Ordering;

    const SAMPLE_BODY: &str = r#"{"Name":"prefix","Value":10}"#;

    #[tokio::test]
    async fn test_public_key_distribution() {
        let backend = SampleBackend::spawn().await.unwrap();
        let gateway = TestGateway::spawn(&backend).await.unwrap();

        let pem = GatewayClient::fetch_public_key(&gateway.client_config())
            .await
            .unwrap();
        assert_eq!(pem, GATEWAY_PUBLIC_KEY_PEM.trim());
        assert_eq!(backend.hits(), 0);
    }

    #[tokio::test]
    async fn test_post_value_roundtrip() {
        let backend = SampleBackend::spawn().await.unwrap();
        let gateway = TestGateway::spawn(&backend).await.unwrap();
        let client = gateway.client().await.unwrap();

        let id = client
            .send(
                Method::POST,
                "sample/api/v1/values",
                Some(SAMPLE_BODY),
                Some("application/json"),
            )
            .await
            .unwrap();
        assert_eq!(id, "\"id-value\"");

        let seen = backend.last_request().unwrap();
        assert_eq!(seen.body, SAMPLE_BODY);
        assert_eq!(seen.content_type.as_deref(), Some("application/json"));
        assert_eq!(seen.envelope_headers, 0);
    }

    #[tokio::test]
    async fn test_get_value_roundtrip() {
        let backend = SampleBackend::spawn().await.unwrap();
        let gateway = TestGateway::spawn(&backend).await.unwrap();
        let client = gateway.client().await.unwrap();

        let value = client
            .send(Method::GET, "sample/api/v1/values/name", None, None)
            .await
            .unwrap();
        assert_eq!(value, "\"value:name\"");
        assert_eq!(backend.hits(), 1);
    }

    #[tokio::test]
    async fn test_backend_error_is_legible() {
        let backend = SampleBackend::spawn().await.unwrap();
        let gateway = TestGateway::spawn(&backend).await.unwrap();
        let client = gateway.client().await.unwrap();

        let result = client
            .send(Method::GET, "sample/api/v1/fail", None, None)
            .await;
        match result {
            Err(ClientError::Rejected(EnvelopeError::UnsuccessfulStatus { status, body })) => {
                assert_eq!(status, 500);
                assert_eq!(body, "backend exploded");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unguarded_route_passes_through() {
        let backend = SampleBackend::spawn().await.unwrap();
        let gateway = TestGateway::spawn(&backend).await.unwrap();

        let response = reqwest::get(gateway.url("/sample/public/ping"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key("x-ssl-signature"));
        assert_eq!(response.text().await.unwrap(), "pong");
        assert_eq!(gateway.metrics.requests_bypassed.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_health_counts_traffic() {
        let backend = SampleBackend::spawn().await.unwrap();
        let gateway = TestGateway::spawn(&backend).await.unwrap();
        let client = gateway.client().await.unwrap();

        client
            .send(Method::POST, "sample/api/v1/values", Some(SAMPLE_BODY), None)
            .await
            .unwrap();
        let _ = client
            .send(Method::GET, "sample/api/v1/fail", None, None)
            .await;

        let health: serde_json::Value = reqwest::get(gateway.url("/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["metrics"]["requests"]["accepted"], 2);
        assert_eq!(health["metrics"]["responses"]["encrypted"], 1);
        assert_eq!(health["metrics"]["responses"]["passed_through"], 1);
    }
}
