//! reqwest-backed [`SessionClient`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, instrument};

use vyos_session::{ConfigEntry, ConfigPath, SessionClient, TransportError, TransportResult};

use crate::api::{self, CONFIGURE_ENDPOINT, CONFIG_FILE_ENDPOINT, RETRIEVE_ENDPOINT};
use crate::error::{ClientError, ClientResult};

/// Default upper bound for one API call. Saves and large commits on slow
/// devices take minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Certificate trust policy, fixed when the client is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsPolicy {
    /// Verify the device certificate against the system roots.
    Verify,
    /// Accept any certificate (self-signed device certificates).
    AcceptAny,
}

/// Settings for [`HttpSessionClient`].
#[derive(Clone)]
pub struct HttpClientConfig {
    /// Device base URL, e.g. `https://192.0.2.1`.
    pub url: String,
    /// API key.
    pub key: String,
    /// Per-call timeout.
    pub timeout: Duration,
    /// Certificate trust policy.
    pub tls: TlsPolicy,
}

impl HttpClientConfig {
    /// Creates settings with the default timeout, accepting any certificate.
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
            timeout: DEFAULT_TIMEOUT,
            tls: TlsPolicy::AcceptAny,
        }
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the certificate trust policy.
    pub fn with_tls(mut self, tls: TlsPolicy) -> Self {
        self.tls = tls;
        self
    }
}

impl fmt::Debug for HttpClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClientConfig")
            .field("url", &self.url)
            .field("key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("tls", &self.tls)
            .finish()
    }
}

/// Session client speaking the VyOS REST API.
pub struct HttpSessionClient {
    http: reqwest::Client,
    endpoint: String,
    key: String,
    timeout: Duration,
}

impl HttpSessionClient {
    /// Builds the client. The URL must be absolute http(s).
    pub fn new(config: HttpClientConfig) -> ClientResult<Self> {
        let endpoint = validate_url(&config.url)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.tls == TlsPolicy::AcceptAny)
            .build()?;

        debug!(endpoint = %endpoint, tls = ?config.tls, timeout = ?config.timeout, "Built HTTP session client");

        Ok(Self {
            http,
            endpoint,
            key: config.key,
            timeout: config.timeout,
        })
    }

    /// Posts one command and returns the `data` field of the response.
    #[instrument(skip(self, payload), fields(endpoint = %self.endpoint))]
    async fn call(&self, api_endpoint: &str, payload: &Value) -> TransportResult<Option<Value>> {
        let url = format!("{}/{}", self.endpoint, api_endpoint);
        let data = payload.to_string();

        let response = self
            .http
            .post(&url)
            .form(&[("data", data.as_str()), ("key", self.key.as_str())])
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_error(e))?;
        debug!(status, bytes = body.len(), "Received response");

        api::interpret(status, &body)
    }

    fn map_error(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else if error.is_decode() {
            TransportError::decode(error.to_string())
        } else {
            TransportError::network(error.to_string())
        }
    }
}

#[async_trait]
impl SessionClient for HttpSessionClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn apply_mutation(&self, entry: &ConfigEntry) -> TransportResult<()> {
        self.call(CONFIGURE_ENDPOINT, &api::mutation_payload(entry))
            .await
            .map(|_| ())
    }

    async fn save(&self) -> TransportResult<()> {
        self.call(CONFIG_FILE_ENDPOINT, &api::save_payload(None))
            .await
            .map(|_| ())
    }

    async fn save_as(&self, file: &str) -> TransportResult<()> {
        self.call(CONFIG_FILE_ENDPOINT, &api::save_payload(Some(file)))
            .await
            .map(|_| ())
    }

    async fn retrieve(&self, path: &ConfigPath) -> TransportResult<Option<Value>> {
        match self
            .call(RETRIEVE_ENDPOINT, &api::show_config_payload(path))
            .await
        {
            Ok(data) => Ok(data),
            Err(e) if api::is_missing_path(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl fmt::Debug for HttpSessionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSessionClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Validates a device URL and returns it without trailing slash.
pub fn validate_url(url: &str) -> ClientResult<String> {
    let parsed = Url::parse(url).map_err(|e| ClientError::invalid_url(url, e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ClientError::invalid_url(
                url,
                format!("unsupported scheme '{}'", other),
            ))
        }
    }
    if parsed.host_str().is_none() {
        return Err(ClientError::invalid_url(url, "missing host"));
    }

    Ok(url.trim_end_matches('/').to_string())
}
