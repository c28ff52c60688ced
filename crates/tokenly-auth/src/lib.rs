//! Request signing for HMAC-authenticated JSON APIs
//!
//! This crate defines the [`AuthenticationGenerator`] capability consumed by
//! `tokenly-api` and ships [`HmacGenerator`], an HMAC-SHA256 implementation.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tokenly_auth::{AuthenticationGenerator, Credentials, Headers, HmacGenerator, SignRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let creds = Credentials::new("my-client-id", "my-client-secret");
//! let params = json!({"name": "alice"});
//!
//! let request = SignRequest {
//!     method: "POST",
//!     url: "https://api.example.com/v1/users",
//!     params: &params,
//!     client_id: Some(creds.client_id()),
//!     client_secret: Some(creds.client_secret()),
//! };
//!
//! let headers = HmacGenerator::new().sign(&request, Headers::new())?;
//! assert!(headers.contains_key("X-Tokenly-Auth-Signature"));
//! # Ok(())
//! # }
//! ```

mod credentials;
mod error;
mod generator;

pub use credentials::{Credentials, CLIENT_ID_ENV, CLIENT_SECRET_ENV};
pub use error::{AuthError, AuthResult};
pub use generator::{
    is_empty_params, AuthenticationGenerator, Headers, HmacGenerator, SignRequest,
    DEFAULT_HEADER_PREFIX,
};

// Re-exported so callers can build `SignRequest` without depending on secrecy
pub use secrecy::{ExposeSecret, SecretString};
