//! HTTP transport abstraction
//!
//! [`ApiClient`](crate::ApiClient) never talks to the network itself: it hands
//! a fully prepared [`TransportRequest`] to a [`Transport`] and gets the raw
//! status code and body back. [`ReqwestTransport`] is the real implementation;
//! `MockTransport` (tests, or the `test-utils` feature) replays canned
//! responses and records what it was sent.
//!
//! # Example
//!
//! ```no_run
//! use tokenly_api::transport::{ReqwestTransport, Transport, TransportConfig, TransportRequest};
//! use tokenly_api::Method;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = ReqwestTransport::with_config(TransportConfig::new().with_timeout(10))?;
//! let response = transport
//!     .request(TransportRequest::new("https://api.example.com/status", Method::Get))
//!     .await?;
//! println!("{}: {}", response.status_code, response.body);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokenly_auth::Headers;
use tracing::{debug, info, instrument};

use crate::form;
use crate::options::{Method, RequestOptions};

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default user agent
const DEFAULT_USER_AGENT: &str = concat!("tokenly-api/", env!("CARGO_PKG_VERSION"));

/// Transport layer errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP request failed (connection, timeout, TLS, invalid header...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Parameters could not be encoded for the wire
    #[error("failed to encode parameters: {0}")]
    Encode(String),

    /// The transport could not produce a response
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Outgoing request body
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body
    Empty,
    /// Parameters left for the transport to encode (query string or form)
    Params(Value),
    /// Pre-serialized JSON text
    Json(String),
}

impl RequestBody {
    /// Parameters, if the body carries them unserialized
    pub fn params(&self) -> Option<&Value> {
        match self {
            RequestBody::Params(params) => Some(params),
            _ => None,
        }
    }

    /// JSON text, if the body was serialized
    pub fn json(&self) -> Option<&str> {
        match self {
            RequestBody::Json(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }
}

/// A fully prepared request
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub url: String,
    pub headers: Headers,
    pub body: RequestBody,
    pub method: Method,
    pub options: RequestOptions,
}

impl TransportRequest {
    /// Bodyless request without extra headers
    pub fn new(url: impl Into<String>, method: Method) -> Self {
        Self {
            url: url.into(),
            headers: Headers::new(),
            body: RequestBody::Empty,
            method,
            options: RequestOptions::default(),
        }
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw response as seen on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status_code: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }
}

/// Capability that performs one HTTP exchange
///
/// Implementations own connection handling and timeouts. Failures are
/// returned as-is; the client never retries.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return the status code and body
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Configuration for [`ReqwestTransport`]
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Custom user agent
    pub user_agent: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
        }
    }
}

impl TransportConfig {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Real transport backed by `reqwest`
///
/// `RequestBody::Params` becomes a query string for GET and DELETE and a
/// form-encoded body for every other method.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with default configuration
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(TransportConfig::default())
    }

    /// Create a transport with custom configuration
    pub fn with_config(config: TransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))
            .build()?;

        info!(timeout_secs = config.timeout_secs, "Created HTTP transport");

        Ok(Self { client })
    }

    /// Wrap an existing `reqwest` client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let has_content_type = request.header(CONTENT_TYPE.as_str()).is_some();
        let mut builder = self
            .client
            .request(request.method.into(), request.url.as_str());

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        match &request.body {
            RequestBody::Empty => {}
            RequestBody::Json(text) => builder = builder.body(text.clone()),
            RequestBody::Params(params) => match request.method {
                Method::Get | Method::Delete => {
                    let pairs = form::flatten(params)?;
                    if !pairs.is_empty() {
                        builder = builder.query(&pairs);
                    }
                }
                _ => {
                    let encoded = form::encode(params)?;
                    if !has_content_type {
                        builder = builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded");
                    }
                    builder = builder.body(encoded);
                }
            },
        }

        if let Some(timeout) = request.options.timeout {
            builder = builder.timeout(timeout);
        }

        debug!("Sending request");

        let response = builder.send().await?;
        let status_code = response.status().as_u16();
        let body = response.text().await?;

        debug!(status_code, len = body.len(), "Received response");

        Ok(TransportResponse { status_code, body })
    }
}

/// Mock transport for testing
///
/// Replays queued responses in order and records every request it receives.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: parking_lot::Mutex<std::collections::VecDeque<Result<TransportResponse, TransportError>>>,
    requests: parking_lot::Mutex<Vec<TransportRequest>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response
    pub fn push_response(&self, status_code: u16, body: impl Into<String>) {
        self.responses
            .lock()
            .push_back(Ok(TransportResponse::new(status_code, body)));
    }

    /// Queue a JSON response
    pub fn push_json(&self, status_code: u16, body: &Value) {
        self.push_response(status_code, body.to_string());
    }

    /// Queue a transport failure
    pub fn push_error(&self, error: TransportError) {
        self.responses.lock().push_back(Err(error));
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    /// Most recent request
    pub fn last_request(&self) -> Option<TransportRequest> {
        self.requests.lock().last().cloned()
    }

    /// Number of requests received
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Unavailable("no mock response queued".into())))
    }
}
