//! Gateway client: seals requests, sends them with reqwest and opens the
//! responses.

use crate::config::ClientConfig;
use crate::error::ClientError;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};
use ssl_crypto::RsaPublicCipher;
use ssl_envelope::{EnvelopeBuilder, EnvelopeConfig, EnvelopeError};
use tracing::{debug, info, warn};

/// Client bound to one gateway and its public key.
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base: Url,
    builder: EnvelopeBuilder,
}

impl GatewayClient {
    /// Client for a gateway whose public key is already known.
    pub fn new(config: &ClientConfig, public_key_pem: &str) -> Result<Self, ClientError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let base = parse_base(&config.gateway_address)?;
        let gateway_key = RsaPublicCipher::from_pem(public_key_pem)?;
        let builder = EnvelopeBuilder::new(
            EnvelopeConfig::with_window(config.response_window()),
            gateway_key,
        );
        Ok(Self {
            http,
            base,
            builder,
        })
    }

    /// Client using the configured key, or the one the gateway serves.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let pem = match &config.public_key_pem {
            Some(pem) => pem.clone(),
            None => Self::fetch_public_key(config).await?,
        };
        Self::new(config, &pem)
    }

    /// `GET <gateway><public_key_path>`
    pub async fn fetch_public_key(config: &ClientConfig) -> Result<String, ClientError> {
        let url = parse_base(&config.gateway_address)?
            .join(&config.public_key_path)
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let response = http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Public key request failed");
            return Err(ClientError::PublicKeyUnavailable(status.as_u16()));
        }

        let pem = response.text().await?;
        info!(url = %url, "Fetched gateway public key");
        Ok(pem)
    }

    /// Seal and send one request; return the verified, decrypted response
    /// body.
    ///
    /// `path` is relative to the gateway address. A non-2xx response comes
    /// back as `ClientError::Rejected(EnvelopeError::UnsuccessfulStatus)`
    /// carrying the plaintext body.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<String, ClientError> {
        let url = self.url_for(path)?;
        let sealed = self.builder.build_request(&method, url.path(), body)?;

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .headers(sealed.headers.clone());
        if let Some(content_type) = content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }
        if let Some(body) = sealed.body.clone() {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await?;
        debug!(method = %method, url = %url, status = status.as_u16(), "Gateway responded");

        match self
            .builder
            .verify_response(status, &headers, &text, &sealed.secrets)
        {
            Ok(plaintext) => Ok(plaintext),
            Err(EnvelopeError::UnsuccessfulStatus { status, body }) => {
                warn!(method = %method, url = %url, status, "Request failed");
                Err(EnvelopeError::UnsuccessfulStatus { status, body }.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn url_for(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", path, e)))
    }
}

/// Gateway address with a trailing slash so relative paths join beneath it.
fn parse_base(address: &str) -> Result<Url, ClientError> {
    let mut base = Url::parse(address).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}
