//! Error types for request signing

/// Errors that can occur while producing authentication headers
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Client id or secret was not configured
    #[error("Missing credentials: {0}")]
    MissingCredentials(&'static str),

    /// Invalid API credentials
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The request URL could not be normalized for signing
    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Parameters could not be serialized into the string to sign
    #[error("Failed to serialize parameters: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Environment variable not set
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
