//! Error types for API calls

use tokenly_auth::AuthError;

use crate::transport::TransportError;

/// Code carried by errors that are not status-driven
pub const DEFAULT_ERROR_CODE: u16 = 1;

/// Message used when the response body is not JSON
pub const UNEXPECTED_RESPONSE: &str = "Unexpected response";

/// Errors that can occur during an API call
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The transport failed; passed through untouched
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The authentication generator failed; passed through untouched
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The API reported an error, or the response could not be understood
    ///
    /// `code` is the HTTP status for 4xx/5xx responses and
    /// [`DEFAULT_ERROR_CODE`] otherwise. Unparseable bodies also use
    /// [`DEFAULT_ERROR_CODE`], so code 1 alone does not tell the two apart.
    #[error("API error {code}: {message}")]
    Api {
        /// Error message from the body, or a status fallback
        message: String,
        /// Numeric error code
        code: u16,
    },

    /// Environment variable not set
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),
}

impl ApiError {
    /// API error with an explicit code
    pub fn api(message: impl Into<String>, code: u16) -> Self {
        Self::Api {
            message: message.into(),
            code,
        }
    }

    /// The response body was not valid JSON
    pub fn unexpected_response() -> Self {
        Self::api(UNEXPECTED_RESPONSE, DEFAULT_ERROR_CODE)
    }

    /// Numeric code of an API-level error
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Message of an API-level error
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Whether the error came from an HTTP 4xx/5xx status
    pub fn is_bad_status(&self) -> bool {
        self.code().is_some_and(is_bad_status)
    }
}

/// HTTP status in `[400, 600)`
pub fn is_bad_status(status_code: u16) -> bool {
    (400..600).contains(&status_code)
}

/// Result type for API calls
pub type ApiResult<T> = Result<T, ApiError>;
