//! # Hand-built and Altered Envelopes
//!
//! Raw `reqwest` calls against a live gateway with envelopes built by
//! `EnvelopeBuilder` and then damaged. Every case must answer `401` and
//! leave the backend untouched.

#[cfg(test)]
mod tests {
    use crate::support::{SampleBackend, TestGateway};
    use http::{HeaderMap, Method, StatusCode};
    use ssl_crypto::test_keys::{GATEWAY_PUBLIC_KEY_PEM, OTHER_PUBLIC_KEY_PEM};
    use ssl_crypto::RsaPublicCipher;
    use ssl_envelope::{EnvelopeBuilder, EnvelopeConfig, SealedRequest};
    use ssl_gateway::MemoryStore;
    use std::sync::Arc;

    fn builder() -> EnvelopeBuilder {
        EnvelopeBuilder::new(
            EnvelopeConfig::default(),
            RsaPublicCipher::from_pem(GATEWAY_PUBLIC_KEY_PEM).unwrap(),
        )
    }

    async fn send(
        gateway: &TestGateway,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<String>,
    ) -> (StatusCode, HeaderMap, String) {
        let mut request = reqwest::Client::new()
            .request(method, gateway.url(path))
            .headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }
        let response = request.send().await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        (status, headers, response.text().await.unwrap())
    }

    fn error_code(body: &str) -> String {
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        json["error"]["code"].as_str().unwrap().to_string()
    }

    async fn assert_rejected(
        gateway: &TestGateway,
        backend: &SampleBackend,
        path: &str,
        sealed: SealedRequest,
        code: &str,
    ) {
        let (status, headers, body) =
            send(gateway, Method::GET, path, sealed.headers, sealed.body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(headers["www-authenticate"], "X-SSL");
        assert_eq!(error_code(&body), code);
        assert_eq!(backend.hits(), 0);
    }

    #[tokio::test]
    async fn test_missing_headers() {
        let backend = SampleBackend::spawn().await.unwrap();
        let gateway = TestGateway::spawn(&backend).await.unwrap();
        let (status, _, body) = send(
            &gateway,
            Method::GET,
            "/sample/api/v1/values/name",
            HeaderMap::new(),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(&body), "MissingHeader");
        assert_eq!(backend.hits(), 0);
    }

    #[tokio::test]
    async fn test_signature_does_not_transfer_to_other_path() {
        let backend = SampleBackend::spawn().await.unwrap();
        let gateway = TestGateway::spawn(&backend).await.unwrap();
        let sealed = builder()
            .build_request(&Method::GET, "/sample/api/v1/values/name", None)
            .unwrap();
        assert_rejected(
            &gateway,
            &backend,
            "/sample/api/v1/values/other",
            sealed,
            "SignatureMismatch",
        )
        .await;
    }

    #[tokio::test]
    async fn test_stale_timestamp() {
        let backend = SampleBackend::spawn().await.unwrap();
        let gateway = TestGateway::spawn(&backend).await.unwrap();
        let mut sealed = builder()
            .build_request(&Method::GET, "/sample/api/v1/values/name", None)
            .unwrap();
        let stale = sealed.timestamp - 61_000;
        sealed
            .headers
            .insert("x-ssl-timestamp", stale.to_string().parse().unwrap());
        assert_rejected(
            &gateway,
            &backend,
            "/sample/api/v1/values/name",
            sealed,
            "TimestampExpired",
        )
        .await;
    }

    #[tokio::test]
    async fn test_swapped_security_key() {
        let backend = SampleBackend::spawn().await.unwrap();
        let gateway = TestGateway::spawn(&backend).await.unwrap();
        let mut sealed = builder()
            .build_request(&Method::GET, "/sample/api/v1/values/name", None)
            .unwrap();
        // the signature key is a valid wrapped secret, but not `<key>||<iv>`
        let signature_key = sealed.headers["x-ssl-signaturekey"].clone();
        sealed.headers.insert("x-ssl-securitykey", signature_key);
        assert_rejected(
            &gateway,
            &backend,
            "/sample/api/v1/values/name",
            sealed,
            "InvalidSecurityKey",
        )
        .await;
    }

    #[tokio::test]
    async fn test_sealed_for_another_gateway() {
        let backend = SampleBackend::spawn().await.unwrap();
        let gateway = TestGateway::spawn(&backend).await.unwrap();
        let sealed = EnvelopeBuilder::new(
            EnvelopeConfig::default(),
            RsaPublicCipher::from_pem(OTHER_PUBLIC_KEY_PEM).unwrap(),
        )
        .build_request(&Method::GET, "/sample/api/v1/values/name", None)
        .unwrap();
        assert_rejected(
            &gateway,
            &backend,
            "/sample/api/v1/values/name",
            sealed,
            "InvalidSignatureKey",
        )
        .await;
    }

    #[tokio::test]
    async fn test_unencrypted_body() {
        let backend = SampleBackend::spawn().await.unwrap();
        let gateway = TestGateway::spawn(&backend).await.unwrap();
        let sealed = builder()
            .build_request(&Method::POST, "/sample/api/v1/values", None)
            .unwrap();
        let (status, _, body) = send(
            &gateway,
            Method::POST,
            "/sample/api/v1/values",
            sealed.headers,
            Some("not base64 at all!".to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(&body), "DecryptionFailure");
        assert_eq!(backend.hits(), 0);
    }

    #[tokio::test]
    async fn test_gateway_without_keys() {
        let backend = SampleBackend::spawn().await.unwrap();
        let gateway = TestGateway::spawn_with_store(&backend, Arc::new(MemoryStore::default()))
            .await
            .unwrap();

        let (status, _, body) = send(&gateway, Method::GET, "/rsa/public", HeaderMap::new(), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "not found rsa public key.");

        let sealed = builder()
            .build_request(&Method::GET, "/sample/api/v1/values/name", None)
            .unwrap();
        assert_rejected(
            &gateway,
            &backend,
            "/sample/api/v1/values/name",
            sealed,
            "KeyUnavailable",
        )
        .await;
    }

    #[tokio::test]
    async fn test_key_installed_after_start() {
        let backend = SampleBackend::spawn().await.unwrap();
        let store = Arc::new(MemoryStore::default());
        let gateway = TestGateway::spawn_with_store(&backend, Arc::clone(&store))
            .await
            .unwrap();

        let (status, _, _) = send(&gateway, Method::GET, "/rsa/public", HeaderMap::new(), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // misses are not cached
        store.insert("rsa/public", GATEWAY_PUBLIC_KEY_PEM);
        let (status, _, body) = send(&gateway, Method::GET, "/rsa/public", HeaderMap::new(), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, GATEWAY_PUBLIC_KEY_PEM.trim());
    }
}
