//! Concrete request produced from an endpoint call

use super::{Headers, HttpMethod, PreparedBody};

/// A fully resolved request, ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// URL with every resolvable placeholder substituted. May be relative.
    pub url: String,
    /// Query parameters, in order.
    pub query: Vec<(String, String)>,
    /// Outgoing headers.
    pub headers: Headers,
    /// Encoded body.
    pub body: PreparedBody,
}

impl PreparedRequest {
    /// Creates a request without query, headers or body.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Headers::new(),
            body: PreparedBody::None,
        }
    }

    /// Returns the declared `Content-Type`.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("Content-Type")
    }
}
