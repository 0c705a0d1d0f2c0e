//! Authorization header provider port

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use crate::error::AuthorizationError;

/// Header name to value map merged into outgoing requests.
pub type AuthorizationHeaders = BTreeMap<String, String>;

/// Future returned by [`AuthorizationHeadersProvider::headers`].
pub type AuthorizationFuture<'a> =
    Pin<Box<dyn Future<Output = Result<AuthorizationHeaders, AuthorizationError>> + Send + 'a>>;

/// Supplies authorization headers for each call.
///
/// The provider is awaited once per call, so it may refresh tokens or read
/// them from a store.
///
/// Any `Fn() -> impl Future<Output = Result<AuthorizationHeaders, _>>`
/// closure is a provider:
///
/// ```
/// use conduit_application::AuthorizationError;
/// use conduit_application::ports::{AuthorizationHeaders, AuthorizationHeadersProvider};
///
/// let provider = || async {
///     Ok::<_, AuthorizationError>(AuthorizationHeaders::from([(
///         "Authorization".to_string(),
///         "Bearer token".to_string(),
///     )]))
/// };
/// fn assert_provider(_: &impl AuthorizationHeadersProvider) {}
/// assert_provider(&provider);
/// ```
pub trait AuthorizationHeadersProvider: Send + Sync {
    /// Resolves the headers for one call.
    fn headers(&self) -> AuthorizationFuture<'_>;
}

impl<F, Fut> AuthorizationHeadersProvider for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<AuthorizationHeaders, AuthorizationError>> + Send + 'static,
{
    fn headers(&self) -> AuthorizationFuture<'_> {
        Box::pin(self())
    }
}

/// Provider returning the same headers on every call.
#[derive(Debug, Clone, Default)]
pub struct StaticHeaders {
    headers: AuthorizationHeaders,
}

impl StaticHeaders {
    /// Creates a provider from fixed headers.
    #[must_use]
    pub const fn new(headers: AuthorizationHeaders) -> Self {
        Self { headers }
    }

    /// Provider sending `Authorization: Bearer <token>`.
    #[must_use]
    pub fn bearer(token: impl AsRef<str>) -> Self {
        Self::new(AuthorizationHeaders::from([(
            "Authorization".to_string(),
            format!("Bearer {}", token.as_ref()),
        )]))
    }
}

impl AuthorizationHeadersProvider for StaticHeaders {
    fn headers(&self) -> AuthorizationFuture<'_> {
        let headers = self.headers.clone();
        Box::pin(async move { Ok(headers) })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_bearer_provider() {
        let headers = StaticHeaders::bearer("abc").headers().await.unwrap();
        assert_eq!(
            headers.get("Authorization").map(String::as_str),
            Some("Bearer abc")
        );
    }

    #[tokio::test]
    async fn test_closure_provider() {
        let provider =
            || async { Err::<AuthorizationHeaders, _>(AuthorizationError::new("refresh failed")) };
        let result = provider.headers().await;
        assert_eq!(result, Err(AuthorizationError::new("refresh failed")));
    }
}
