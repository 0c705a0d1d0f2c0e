//! Domain error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Domain-level errors that can occur while preparing a call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// Call parameters did not serialize to a JSON object.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// The request body could not be encoded.
    #[error("invalid body: {0}")]
    InvalidBody(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// The single normalized failure shape of an endpoint call.
///
/// Serialized with the same field names the server uses for error bodies,
/// so a decoded error response and a locally produced error look alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{error_code} ({code}): {error_message}")]
pub struct EndpointError {
    /// Numeric status, usually the HTTP status of the response.
    pub code: u16,
    /// Symbolic error code.
    pub error_code: String,
    /// Human-readable message.
    pub error_message: String,
    /// Optional opaque payload supplied by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_data: Option<serde_json::Value>,
}

impl EndpointError {
    /// Error code for failures that carry no better description.
    pub const UNKNOWN: &'static str = "UnknownError";
    /// Error code for a call aborted at the transport level.
    pub const TRANSPORT_CANCELLED: &'static str = "AxiosCancelError";
    /// Error code for an explicit cancel that was surfaced to the state.
    pub const REQUEST_CANCELED: &'static str = "RequestCanceled";
    /// Error code for a secure endpoint called without a header provider.
    pub const NO_AUTHORIZATION_PROVIDER: &'static str = "NoAuthorizationHeaderProvider";

    /// Status used for both cancellation flavors.
    pub const CANCELLED_STATUS: u16 = 449;

    /// Creates an error without payload.
    #[must_use]
    pub fn new(code: u16, error_code: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            code,
            error_code: error_code.into(),
            error_message: error_message.into(),
            error_data: None,
        }
    }

    /// Attaches an opaque payload.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.error_data = Some(data);
        self
    }

    /// Generic failure: network errors, malformed responses, provider failures.
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(500, Self::UNKNOWN, "Unknown Error")
    }

    /// Generic failure with a specific message.
    #[must_use]
    pub fn unknown_with_message(message: impl Into<String>) -> Self {
        Self::new(500, Self::UNKNOWN, message)
    }

    /// The call was aborted before it produced a result.
    #[must_use]
    pub fn transport_cancelled() -> Self {
        Self::new(
            Self::CANCELLED_STATUS,
            Self::TRANSPORT_CANCELLED,
            "Request was canceled",
        )
    }

    /// The call was cancelled and the caller asked for that to be visible.
    #[must_use]
    pub fn request_canceled() -> Self {
        Self::new(
            Self::CANCELLED_STATUS,
            Self::REQUEST_CANCELED,
            "Request was canceled",
        )
    }

    /// A secure endpoint was called without an authorization header provider.
    #[must_use]
    pub fn no_authorization_provider() -> Self {
        Self::new(
            403,
            Self::NO_AUTHORIZATION_PROVIDER,
            "Endpoint is secure but no authorization header provider is configured",
        )
    }

    /// Returns true for a transport-level cancellation, which is never
    /// surfaced to datasource state.
    #[must_use]
    pub fn is_transport_cancel(&self) -> bool {
        self.error_code == Self::TRANSPORT_CANCELLED
    }

    /// Rebuilds an error from a failed response.
    ///
    /// The status becomes `code` (500 when absent); fields present in the
    /// body replace the generic defaults one by one.
    #[must_use]
    pub fn from_response(status: Option<u16>, body: Option<ErrorBody>) -> Self {
        let mut error = Self::unknown();

        if let Some(status) = status.filter(|s| *s != 0) {
            error.code = status;
        }

        if let Some(body) = body {
            if let Some(code) = body.error_code.filter(|c| !c.is_empty()) {
                error.error_code = code;
            }
            if let Some(message) = body.error_message.filter(|m| !m.is_empty()) {
                error.error_message = message;
            }
            error.error_data = body.error_data.filter(|d| !d.is_null());
        }

        error
    }
}

/// Error body a server returns alongside a non-success status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Symbolic error code.
    #[serde(default)]
    pub error_code: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Opaque payload.
    #[serde(default)]
    pub error_data: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Parses an error body, returning `None` when the bytes are not a JSON
    /// object.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}
