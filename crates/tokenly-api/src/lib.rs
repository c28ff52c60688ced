//! Thin client for JSON APIs with HMAC-signed private endpoints
//!
//! [`ApiClient`] builds request URLs, signs private calls through an
//! [`AuthenticationGenerator`], encodes parameters, dispatches through a
//! pluggable [`Transport`] and turns each response into the parsed JSON or an
//! [`ApiError`].
//!
//! # Features
//!
//! - **Verbs**: `get`, `get_public`, `post`, `put`, `patch`, `delete` and the
//!   generic `call`
//! - **Signing**: any [`AuthenticationGenerator`]; [`HmacGenerator`] ships in
//!   `tokenly-auth`
//! - **Transport**: [`ReqwestTransport`] by default, `MockTransport` with the
//!   `test-utils` feature
//!
//! # Errors
//!
//! Bodies of the form `{"error": ...}` or `{"errors": ..., "message"?: ...}`
//! and any 4xx/5xx status become [`ApiError::Api`]. The code is the HTTP status
//! for bad statuses and `1` otherwise, including for bodies that are not JSON.
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use tokenly_api::ApiClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::with_default_transport("https://api.example.com")?;
//!     let assets = client.get_public("assets", json!({"limit": 10})).await?;
//!     println!("{}", assets);
//!     Ok(())
//! }
//! ```
//!
//! There is no retry, rate limiting or pagination; failures surface as-is.

pub mod client;
pub mod error;
pub mod form;
pub mod options;
pub mod response;
pub mod transport;

// Re-export main types
pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
pub use options::{CallOptions, Method, PostType, RequestOptions};
pub use transport::{
    ReqwestTransport, RequestBody, Transport, TransportConfig, TransportError, TransportRequest,
    TransportResponse,
};

#[cfg(any(test, feature = "test-utils"))]
pub use transport::MockTransport;

// Re-export signing types
pub use tokenly_auth::{
    AuthError, AuthenticationGenerator, Credentials, Headers, HmacGenerator, SignRequest,
};
