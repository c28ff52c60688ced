//! Request methods and per-call options

use std::fmt;
use std::time::Duration;

/// HTTP method of an API call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Upper-case wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// How non-GET parameters are encoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostType {
    /// JSON body with `Content-Type: application/json`
    #[default]
    Json,
    /// Form fields, encoded by the transport
    Form,
}

/// Options handed to the transport untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Per-request timeout, overriding the transport default
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Options for a single [`ApiClient::call`](crate::ApiClient::call)
///
/// Defaults to a signed JSON call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Body encoding for non-GET methods
    pub post_type: PostType,
    /// Skip request signing entirely
    pub public: bool,
    /// Transport pass-through options
    pub request: RequestOptions,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for an unsigned call
    pub fn public() -> Self {
        Self {
            public: true,
            ..Self::default()
        }
    }

    /// Set the body encoding
    pub fn with_post_type(mut self, post_type: PostType) -> Self {
        self.post_type = post_type;
        self
    }

    /// Mark the call as public (unsigned) or private
    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    /// Set the transport pass-through options
    pub fn with_request_options(mut self, request: RequestOptions) -> Self {
        self.request = request;
        self
    }
}
