//! Authentication generators
//!
//! An [`AuthenticationGenerator`] turns a request description plus client
//! credentials into the headers that authenticate it. [`HmacGenerator`] is the
//! stock implementation: an HMAC-SHA256 signature over the method, normalized
//! URL, JSON parameters, client id and a nonce.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{AuthError, AuthResult};

type HmacSha256 = Hmac<Sha256>;

/// Request headers, keyed by header name
pub type Headers = BTreeMap<String, String>;

/// Header prefix used by [`HmacGenerator`] unless overridden
pub const DEFAULT_HEADER_PREFIX: &str = "X-Tokenly-Auth";

/// Everything a generator may look at when signing one request
#[derive(Debug, Clone, Copy)]
pub struct SignRequest<'a> {
    /// HTTP method, upper case (`GET`, `POST`, ...)
    pub method: &'a str,
    /// Fully built request URL
    pub url: &'a str,
    /// Request parameters as supplied by the caller
    pub params: &'a Value,
    /// Client id, if configured
    pub client_id: Option<&'a str>,
    /// Client secret, if configured
    pub client_secret: Option<&'a SecretString>,
}

/// Capability that produces authentication headers for a request
///
/// Implementations must not keep per-call state: the client may invoke the
/// same generator from many tasks at once.
pub trait AuthenticationGenerator: Send + Sync {
    /// Return `headers` with the authentication headers for `request` added
    fn sign(&self, request: &SignRequest<'_>, headers: Headers) -> AuthResult<Headers>;
}

/// Whether a parameter value counts as "no parameters"
///
/// `null`, `{}`, `[]`, `""`, `"0"`, `false` and `0` are all empty.
pub fn is_empty_params(params: &Value) -> bool {
    match params {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// HMAC-SHA256 request signer
///
/// String to sign: `METHOD\nURL\nPARAMS\nCLIENT_ID\nNONCE`, where URL has its
/// query string removed and PARAMS is the compact JSON of the parameters
/// (`{}` when empty). The base64 signature is sent alongside the client id and
/// nonce in three `<prefix>-*` headers.
#[derive(Debug, Clone)]
pub struct HmacGenerator {
    header_prefix: String,
}

impl HmacGenerator {
    /// Create a generator using [`DEFAULT_HEADER_PREFIX`]
    pub fn new() -> Self {
        Self {
            header_prefix: DEFAULT_HEADER_PREFIX.to_string(),
        }
    }

    /// Use a different header prefix (e.g. `X-Acme-Auth`)
    pub fn with_header_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.header_prefix = prefix.into();
        self
    }

    /// Header prefix in use
    pub fn header_prefix(&self) -> &str {
        &self.header_prefix
    }

    /// Name of the header carrying the client id
    pub fn api_token_header(&self) -> String {
        format!("{}-Api-Token", self.header_prefix)
    }

    /// Name of the header carrying the nonce
    pub fn nonce_header(&self) -> String {
        format!("{}-Nonce", self.header_prefix)
    }

    /// Name of the header carrying the signature
    pub fn signature_header(&self) -> String {
        format!("{}-Signature", self.header_prefix)
    }

    /// Current UNIX time in seconds
    pub fn current_nonce() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }

    /// Sign with an explicit nonce instead of the current time
    #[instrument(skip(self, request, headers), fields(method = request.method, url = request.url))]
    pub fn sign_with_nonce(
        &self,
        request: &SignRequest<'_>,
        mut headers: Headers,
        nonce: u64,
    ) -> AuthResult<Headers> {
        let client_id = request
            .client_id
            .ok_or(AuthError::MissingCredentials("client id"))?;
        let client_secret = request
            .client_secret
            .ok_or(AuthError::MissingCredentials("client secret"))?;

        let message = Self::string_to_sign(request, client_id, nonce)?;
        let signature = Self::signature(client_secret.expose_secret().as_bytes(), &message)?;

        debug!(nonce, "Signed request");

        headers.insert(self.api_token_header(), client_id.to_string());
        headers.insert(self.nonce_header(), nonce.to_string());
        headers.insert(self.signature_header(), signature);
        Ok(headers)
    }

    /// Build the newline-joined string the signature covers
    pub fn string_to_sign(
        request: &SignRequest<'_>,
        client_id: &str,
        nonce: u64,
    ) -> AuthResult<String> {
        let url = normalize_url(request.url)?;
        let params = if is_empty_params(request.params) {
            "{}".to_string()
        } else {
            serde_json::to_string(request.params)?
        };

        Ok([
            request.method.to_string(),
            url,
            params,
            client_id.to_string(),
            nonce.to_string(),
        ]
        .join("\n"))
    }

    /// Base64 HMAC-SHA256 of `message` keyed with `secret`
    pub fn signature(secret: &[u8], message: &str) -> AuthResult<String> {
        let mut mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| AuthError::InvalidCredentials(e.to_string()))?;
        mac.update(message.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

impl Default for HmacGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthenticationGenerator for HmacGenerator {
    fn sign(&self, request: &SignRequest<'_>, headers: Headers) -> AuthResult<Headers> {
        self.sign_with_nonce(request, headers, Self::current_nonce())
    }
}

/// `scheme://host[:port]/path`, dropping query and fragment
fn normalize_url(raw: &str) -> AuthResult<String> {
    let url = Url::parse(raw).map_err(|source| AuthError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;

    let mut normalized = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
    if let Some(port) = url.port() {
        normalized.push_str(&format!(":{}", port));
    }
    normalized.push_str(url.path());
    Ok(normalized)
}
