//! Main API client implementation

use crate::error::{ApiError, ApiResult};
use crate::options::{CallOptions, Method, PostType};
use crate::response;
use crate::transport::{ReqwestTransport, RequestBody, Transport, TransportRequest};
use serde_json::Value;
use std::sync::Arc;
use tokenly_auth::{
    is_empty_params, AuthenticationGenerator, Credentials, Headers, SecretString, SignRequest,
};
use tracing::{debug, info, instrument};

/// Environment variable holding the API base URL
pub const BASE_URL_ENV: &str = "TOKENLY_API_BASE_URL";

/// Thin client for a JSON API with signed private endpoints
///
/// Every call builds `base_url/path`, signs it unless the call is public,
/// encodes the parameters, sends it through the [`Transport`] and turns the
/// response into either the parsed JSON or an [`ApiError`].
///
/// # Example
///
/// ```no_run
/// use serde_json::json;
/// use std::sync::Arc;
/// use tokenly_api::{ApiClient, Credentials, HmacGenerator};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = ApiClient::with_default_transport("https://api.example.com/v1")?
///         .with_authentication(Arc::new(HmacGenerator::new()))
///         .with_credentials(Credentials::from_env()?);
///
///     let status = client.get_public("status", json!({})).await?;
///     let user = client.post("users", json!({"name": "alice"})).await?;
///     println!("{} {}", status, user);
///
///     Ok(())
/// }
/// ```
pub struct ApiClient {
    api_base_url: String,
    generator: Option<Arc<dyn AuthenticationGenerator>>,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    /// Create an unauthenticated client over `transport`
    ///
    /// The base URL is used verbatim.
    pub fn new(api_base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        let api_base_url = api_base_url.into();
        info!(base_url = %api_base_url, "Created API client");

        Self {
            api_base_url,
            generator: None,
            client_id: None,
            client_secret: None,
            transport,
        }
    }

    /// Create a client backed by [`ReqwestTransport`]
    pub fn with_default_transport(api_base_url: impl Into<String>) -> ApiResult<Self> {
        let transport = ReqwestTransport::new()?;
        Ok(Self::new(api_base_url, Arc::new(transport)))
    }

    /// Create a client from `TOKENLY_API_BASE_URL`, `TOKENLY_CLIENT_ID` and
    /// `TOKENLY_CLIENT_SECRET`
    ///
    /// Only the base URL is required; missing credentials are left unset.
    pub fn from_env(generator: Option<Arc<dyn AuthenticationGenerator>>) -> ApiResult<Self> {
        let base_url = std::env::var(BASE_URL_ENV)
            .map_err(|_| ApiError::EnvVarNotSet(BASE_URL_ENV.to_string()))?;

        let mut client = Self::with_default_transport(base_url)?;
        client.generator = generator;
        client.client_id = std::env::var(tokenly_auth::CLIENT_ID_ENV).ok();
        client.client_secret = std::env::var(tokenly_auth::CLIENT_SECRET_ENV)
            .ok()
            .map(SecretString::from);
        Ok(client)
    }

    /// Sign private calls with `generator`
    pub fn with_authentication(mut self, generator: Arc<dyn AuthenticationGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the client id handed to the generator
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the client secret handed to the generator
    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::from(client_secret.into()));
        self
    }

    /// Set both client id and secret
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        let (client_id, client_secret) = credentials.into_parts();
        self.client_id = Some(client_id);
        self.client_secret = Some(client_secret);
        self
    }

    /// Base URL every path is appended to
    pub fn base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Configured client id
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Whether private calls will be signed
    pub fn has_authentication(&self) -> bool {
        self.generator.is_some()
    }

    // ========================================================================
    // Verb helpers
    // ========================================================================

    /// Signed GET
    pub async fn get(&self, url: &str, params: Value) -> ApiResult<Value> {
        self.call(Method::Get, url, params, CallOptions::default()).await
    }

    /// Unsigned GET; the generator is never consulted
    pub async fn get_public(&self, url: &str, params: Value) -> ApiResult<Value> {
        self.call(Method::Get, url, params, CallOptions::public()).await
    }

    /// Signed POST
    pub async fn post(&self, url: &str, params: Value) -> ApiResult<Value> {
        self.call(Method::Post, url, params, CallOptions::default()).await
    }

    /// Signed PUT
    pub async fn put(&self, url: &str, params: Value) -> ApiResult<Value> {
        self.call(Method::Put, url, params, CallOptions::default()).await
    }

    /// Signed PATCH
    pub async fn patch(&self, url: &str, params: Value) -> ApiResult<Value> {
        self.call(Method::Patch, url, params, CallOptions::default()).await
    }

    /// Signed DELETE
    pub async fn delete(&self, url: &str, params: Value) -> ApiResult<Value> {
        self.call(Method::Delete, url, params, CallOptions::default()).await
    }

    // ========================================================================
    // Request flow
    // ========================================================================

    /// Perform a call and normalize its response
    ///
    /// # Errors
    /// - [`ApiError::Auth`] if the generator fails
    /// - [`ApiError::Transport`] if the transport fails
    /// - [`ApiError::Api`] for unparseable bodies, body-reported errors and
    ///   4xx/5xx statuses
    #[instrument(skip(self, params, options), fields(method = %method, url = tracing::field::Empty))]
    pub async fn call(
        &self,
        method: Method,
        url: &str,
        params: Value,
        options: CallOptions,
    ) -> ApiResult<Value> {
        let full_url = self.build_url(url);
        tracing::Span::current().record("url", full_url.as_str());

        let request = self.prepare_request(method, full_url, params, options)?;

        debug!(headers = request.headers.len(), "Dispatching request");

        let response = self.transport.request(request).await?;
        response::normalize(&response)
    }

    /// `base_url/url`, with trailing slashes removed from `url`
    pub fn build_url(&self, url: &str) -> String {
        format!("{}/{}", self.api_base_url, url.trim_end_matches('/'))
    }

    /// Build the request [`call`](Self::call) would send, without sending it
    pub fn prepare_request(
        &self,
        method: Method,
        full_url: String,
        params: Value,
        options: CallOptions,
    ) -> ApiResult<TransportRequest> {
        let mut headers = Headers::new();
        if !options.public {
            headers = self.authentication_headers(method, &full_url, &params, headers)?;
        }

        let body = match (method, options.post_type) {
            (Method::Get, _) => RequestBody::Params(params),
            (_, PostType::Json) => {
                headers.insert("Content-Type".to_string(), "application/json".to_string());
                headers.insert("Accept".to_string(), "application/json".to_string());

                if is_empty_params(&params) {
                    RequestBody::Empty
                } else if method == Method::Delete {
                    // DELETE keeps its parameters unserialized; the transport
                    // sends them as a query string
                    RequestBody::Params(params)
                } else {
                    RequestBody::Json(params.to_string())
                }
            }
            (_, PostType::Form) => RequestBody::Params(params),
        };

        Ok(TransportRequest {
            url: full_url,
            headers,
            body,
            method,
            options: options.request,
        })
    }

    fn authentication_headers(
        &self,
        method: Method,
        url: &str,
        params: &Value,
        headers: Headers,
    ) -> ApiResult<Headers> {
        let Some(generator) = &self.generator else {
            return Ok(headers);
        };

        let request = SignRequest {
            method: method.as_str(),
            url,
            params,
            client_id: self.client_id.as_deref(),
            client_secret: self.client_secret.as_ref(),
        };
        Ok(generator.sign(&request, headers)?)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_base_url", &self.api_base_url)
            .field("client_id", &self.client_id)
            .field("has_client_secret", &self.client_secret.is_some())
            .field("has_authentication", &self.has_authentication())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RequestOptions;
    use crate::transport::{MockTransport, TransportError};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::Duration;
    use tokenly_auth::{AuthError, AuthResult, ExposeSecret};

    /// Generator that records what it was asked to sign
    #[derive(Default)]
    struct RecordingGenerator {
        calls: Mutex<Vec<(String, String, Value, Option<String>, Option<String>)>>,
    }

    impl AuthenticationGenerator for RecordingGenerator {
        fn sign(&self, request: &SignRequest<'_>, mut headers: Headers) -> AuthResult<Headers> {
            self.calls.lock().push((
                request.method.to_string(),
                request.url.to_string(),
                request.params.clone(),
                request.client_id.map(str::to_string),
                request.client_secret.map(|s| s.expose_secret().to_string()),
            ));
            headers.insert("X-Signature".to_string(), "signed".to_string());
            Ok(headers)
        }
    }

    struct FailingGenerator;

    impl AuthenticationGenerator for FailingGenerator {
        fn sign(&self, _request: &SignRequest<'_>, _headers: Headers) -> AuthResult<Headers> {
            Err(AuthError::MissingCredentials("client secret"))
        }
    }

    fn client_with(mock: &Arc<MockTransport>) -> ApiClient {
        ApiClient::new("https://api.example.com", mock.clone())
    }

    fn signed_client(
        mock: &Arc<MockTransport>,
        generator: &Arc<RecordingGenerator>,
    ) -> ApiClient {
        client_with(mock)
            .with_authentication(generator.clone())
            .with_client_id("cid")
            .with_client_secret("secret")
    }

    #[test]
    fn test_build_url_strips_trailing_slash() {
        let mock = Arc::new(MockTransport::new());
        let client = client_with(&mock);

        assert_eq!(client.build_url("users/"), "https://api.example.com/users");
        assert_eq!(client.build_url("users//"), "https://api.example.com/users");
        assert_eq!(client.build_url("a/b"), "https://api.example.com/a/b");
    }

    #[tokio::test]
    async fn test_private_call_passes_signer_inputs() {
        let mock = Arc::new(MockTransport::new());
        let generator = Arc::new(RecordingGenerator::default());
        let client = signed_client(&mock, &generator);
        mock.push_response(200, r#"{"ok":true}"#);

        client.put("things/1/", json!({"a": 1})).await.unwrap();

        let calls = generator.calls.lock();
        assert_eq!(calls.len(), 1);
        let (method, url, params, id, secret) = &calls[0];
        assert_eq!(method, "PUT");
        assert_eq!(url, "https://api.example.com/things/1");
        assert_eq!(params, &json!({"a": 1}));
        assert_eq!(id.as_deref(), Some("cid"));
        assert_eq!(secret.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_get_public_never_signs() {
        let mock = Arc::new(MockTransport::new());
        let generator = Arc::new(RecordingGenerator::default());
        let client = signed_client(&mock, &generator);
        mock.push_response(200, "{}");

        client.get_public("status", json!({"verbose": 1})).await.unwrap();

        assert!(generator.calls.lock().is_empty());
        let request = mock.last_request().unwrap();
        assert!(request.headers.is_empty());
        assert_eq!(request.body, RequestBody::Params(json!({"verbose": 1})));
    }

    #[tokio::test]
    async fn test_no_generator_means_no_signature() {
        let mock = Arc::new(MockTransport::new());
        let client = client_with(&mock).with_client_id("cid");
        mock.push_response(200, "{}");

        client.get("users", Value::Null).await.unwrap();

        let request = mock.last_request().unwrap();
        assert!(request.headers.is_empty());
        assert_eq!(request.method, Method::Get);
    }

    #[tokio::test]
    async fn test_signer_failure_propagates() {
        let mock = Arc::new(MockTransport::new());
        let client = client_with(&mock).with_authentication(Arc::new(FailingGenerator));

        let err = client.post("users", json!({"a": 1})).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Auth(AuthError::MissingCredentials("client secret"))
        ));
        assert_eq!(mock.request_count(), 0);
    }

    #[test]
    fn test_public_option_skips_failing_signer() {
        let mock = Arc::new(MockTransport::new());
        let client = client_with(&mock).with_authentication(Arc::new(FailingGenerator));

        let request = client
            .prepare_request(
                Method::Post,
                client.build_url("x"),
                json!({"a": 1}),
                CallOptions::public(),
            )
            .unwrap();
        assert!(request.header("X-Signature").is_none());
        assert_eq!(request.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_json_body_for_post_put_patch() {
        let mock = Arc::new(MockTransport::new());
        let generator = Arc::new(RecordingGenerator::default());
        let client = signed_client(&mock, &generator);
        let params = json!({"name": "bob", "tags": ["a", "b"]});

        for method in [Method::Post, Method::Put, Method::Patch] {
            let request = client
                .prepare_request(method, client.build_url("users"), params.clone(), CallOptions::default())
                .unwrap();

            assert_eq!(request.header("X-Signature"), Some("signed"));
            assert_eq!(request.header("Content-Type"), Some("application/json"));
            assert_eq!(request.header("Accept"), Some("application/json"));

            let text = request.body.json().expect("JSON body");
            let decoded: Value = serde_json::from_str(text).unwrap();
            assert_eq!(decoded, params);
        }
    }

    #[test]
    fn test_json_body_empty_params() {
        let mock = Arc::new(MockTransport::new());
        let client = client_with(&mock);

        for params in [Value::Null, json!({}), json!([])] {
            let request = client
                .prepare_request(Method::Post, client.build_url("x"), params, CallOptions::default())
                .unwrap();
            assert!(request.body.is_empty());
            assert_eq!(request.header("Content-Type"), Some("application/json"));
        }
    }

    #[test]
    fn test_delete_json_keeps_params_unserialized() {
        // Documented quirk: DELETE does not JSON-encode its parameters
        let mock = Arc::new(MockTransport::new());
        let client = client_with(&mock);
        let params = json!({"id": 7, "force": true});

        let request = client
            .prepare_request(Method::Delete, client.build_url("things"), params.clone(), CallOptions::default())
            .unwrap();

        assert_eq!(request.body.params(), Some(&params));
        assert_eq!(request.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_form_post_passes_params_through() {
        let mock = Arc::new(MockTransport::new());
        let client = client_with(&mock);
        let params = json!({"field": "value"});

        let request = client
            .prepare_request(
                Method::Post,
                client.build_url("form"),
                params.clone(),
                CallOptions::new().with_post_type(PostType::Form),
            )
            .unwrap();

        assert_eq!(request.body, RequestBody::Params(params));
        assert!(request.header("Content-Type").is_none());
        assert!(request.header("Accept").is_none());
    }

    #[test]
    fn test_get_ignores_post_type() {
        let mock = Arc::new(MockTransport::new());
        let client = client_with(&mock);

        let request = client
            .prepare_request(Method::Get, client.build_url("x"), json!({"q": 1}), CallOptions::default())
            .unwrap();

        assert_eq!(request.body, RequestBody::Params(json!({"q": 1})));
        assert!(request.header("Content-Type").is_none());
    }

    #[test]
    fn test_request_options_forwarded() {
        let mock = Arc::new(MockTransport::new());
        let client = client_with(&mock);
        let options = CallOptions::new()
            .with_request_options(RequestOptions::new().with_timeout(Duration::from_secs(3)));

        let request = client
            .prepare_request(Method::Get, client.build_url("x"), Value::Null, options)
            .unwrap();
        assert_eq!(request.options.timeout, Some(Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let mock = Arc::new(MockTransport::new());
        let client = client_with(&mock);
        mock.push_error(TransportError::Unavailable("connection refused".into()));

        let err = client.get("users", Value::Null).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(TransportError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_response_normalized() {
        let mock = Arc::new(MockTransport::new());
        let client = client_with(&mock);
        mock.push_response(404, r#"{"error":"not found"}"#);
        mock.push_response(200, r#"{"result":"ok"}"#);

        let err = client.get("missing", Value::Null).await.unwrap_err();
        assert_eq!(err.message(), Some("not found"));
        assert_eq!(err.code(), Some(404));

        let value = client.get("present", Value::Null).await.unwrap();
        assert_eq!(value, json!({"result": "ok"}));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let mock = Arc::new(MockTransport::new());
        let client = client_with(&mock)
            .with_credentials(Credentials::new("cid", "very-secret"));

        let debug = format!("{:?}", client);
        assert!(debug.contains("cid"));
        assert!(!debug.contains("very-secret"));
        assert!(!client.has_authentication());
        assert_eq!(client.client_id(), Some("cid"));
        assert_eq!(client.base_url(), "https://api.example.com");
    }
}
