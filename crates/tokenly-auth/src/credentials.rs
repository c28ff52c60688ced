//! Client credentials for signed API requests
//!
//! # Security
//!
//! The client secret is stored using the `secrecy` crate which:
//! - Zeroizes memory on drop
//! - Prevents accidental logging via Debug impl
//! - Provides explicit access via `expose_secret()`

use secrecy::{ExposeSecret, SecretString};

use crate::error::{AuthError, AuthResult};

/// Environment variable holding the client id
pub const CLIENT_ID_ENV: &str = "TOKENLY_CLIENT_ID";
/// Environment variable holding the client secret
pub const CLIENT_SECRET_ENV: &str = "TOKENLY_CLIENT_SECRET";

/// Client id and secret pair used to sign private requests
pub struct Credentials {
    /// Client id (public, sent as the API token header)
    client_id: String,
    /// Client secret (HMAC key, zeroized on drop)
    client_secret: SecretString,
}

impl Credentials {
    /// Create new credentials from a client id and secret
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
        }
    }

    /// Create credentials from environment variables
    ///
    /// Reads `TOKENLY_CLIENT_ID` and `TOKENLY_CLIENT_SECRET` from the environment.
    pub fn from_env() -> AuthResult<Self> {
        let client_id = std::env::var(CLIENT_ID_ENV)
            .map_err(|_| AuthError::EnvVarNotSet(CLIENT_ID_ENV.to_string()))?;
        let client_secret = std::env::var(CLIENT_SECRET_ENV)
            .map_err(|_| AuthError::EnvVarNotSet(CLIENT_SECRET_ENV.to_string()))?;

        Ok(Self::new(client_id, client_secret))
    }

    /// Get the client id
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Get the client secret
    pub fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }

    /// Split into the id and secret halves
    pub fn into_parts(self) -> (String, SecretString) {
        (self.client_id, self.client_secret)
    }
}

impl Clone for Credentials {
    fn clone(&self) -> Self {
        Self {
            client_id: self.client_id.clone(),
            client_secret: SecretString::from(self.client_secret.expose_secret().to_owned()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials::new("client_123", "super_secret_value");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("super_secret_value"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("client_123"));
    }

    #[test]
    fn test_clone_keeps_secret() {
        let creds = Credentials::new("id", "secret");
        let cloned = creds.clone();
        assert_eq!(cloned.client_id(), "id");
        assert_eq!(cloned.client_secret().expose_secret(), "secret");
    }

    #[test]
    fn test_into_parts() {
        let (id, secret) = Credentials::new("id", "secret").into_parts();
        assert_eq!(id, "id");
        assert_eq!(secret.expose_secret(), "secret");
    }
}
