//! Application error types

use conduit_domain::{DomainError, EndpointError};
use thiserror::Error;

/// Result of one endpoint call: the decoded response or the normalized error.
pub type EndpointResult<T> = Result<T, EndpointError>;

/// Errors a transport can report.
///
/// Non-success HTTP statuses are not transport errors; they come back as a
/// regular response and are mapped by the executor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The URL could not be parsed or joined.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The request or response body could not be transferred.
    #[error("body error: {0}")]
    Body(String),

    /// The transport aborted the request on its own.
    #[error("request cancelled")]
    Cancelled,

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

/// Failure of an authorization header provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("authorization header provider failed: {0}")]
pub struct AuthorizationError(pub String);

impl AuthorizationError {
    /// Creates an error from any message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<TransportError> for EndpointError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Cancelled => Self::transport_cancelled(),
            other => Self::unknown_with_message(other.to_string()),
        }
    }
}

impl From<AuthorizationError> for EndpointError {
    fn from(error: AuthorizationError) -> Self {
        Self::unknown_with_message(error.to_string())
    }
}

/// Maps call preparation errors; they surface as generic failures.
pub(crate) fn from_domain_error(error: &DomainError) -> EndpointError {
    EndpointError::unknown_with_message(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_transport_error_mapping() {
        let error: EndpointError = TransportError::Timeout.into();
        assert_eq!(error.code, 500);
        assert_eq!(error.error_code, "UnknownError");
        assert_eq!(error.error_message, "request timed out");

        let error: EndpointError = TransportError::Cancelled.into();
        assert!(error.is_transport_cancel());
    }

    #[test]
    fn test_authorization_error_mapping() {
        let error: EndpointError = AuthorizationError::new("token expired").into();
        assert_eq!(error.code, 500);
        assert!(error.error_message.contains("token expired"));
    }
}
