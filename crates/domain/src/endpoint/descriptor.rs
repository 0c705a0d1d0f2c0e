//! Endpoint descriptor type

use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;

use crate::request::HttpMethod;

/// Static description of one remote operation.
///
/// `P`, `D` and `R` are the parameter, body and response shapes. They carry
/// no runtime data; they only tie call arguments and decoded responses to
/// the endpoint at compile time.
///
/// # Example
///
/// ```
/// use conduit_domain::endpoint::EndpointDescriptor;
/// use serde_json::Value;
///
/// #[derive(serde::Serialize)]
/// struct UserParams {
///     id: u64,
/// }
///
/// let endpoint: EndpointDescriptor<UserParams, (), Value> =
///     EndpointDescriptor::get("/users/:id").secure();
/// assert!(endpoint.is_secure());
/// ```
pub struct EndpointDescriptor<P = (), D = (), R = serde_json::Value> {
    url: String,
    method: HttpMethod,
    secure: bool,
    params_inline: BTreeSet<String>,
    no_form_data_stringify: bool,
    _shape: PhantomData<fn(P, D) -> R>,
}

impl<P, D, R> EndpointDescriptor<P, D, R> {
    /// Creates a public endpoint.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            secure: false,
            params_inline: BTreeSet::new(),
            no_form_data_stringify: false,
            _shape: PhantomData,
        }
    }

    /// Creates a GET endpoint.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Creates a POST endpoint.
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    /// Creates a PUT endpoint.
    #[must_use]
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    /// Creates a DELETE endpoint.
    #[must_use]
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    /// Marks the endpoint as requiring authorization headers.
    #[must_use]
    pub const fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    /// Declares a parameter as inline: it is never sent in the query string.
    #[must_use]
    pub fn inline_param(mut self, name: impl Into<String>) -> Self {
        self.params_inline.insert(name.into());
        self
    }

    /// Sends non-file multipart fields as plain text instead of JSON.
    #[must_use]
    pub const fn no_form_data_stringify(mut self) -> Self {
        self.no_form_data_stringify = true;
        self
    }

    /// URL template.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Whether authorization headers are required.
    #[must_use]
    pub const fn is_secure(&self) -> bool {
        self.secure
    }

    /// Inline parameter names.
    #[must_use]
    pub const fn params_inline(&self) -> &BTreeSet<String> {
        &self.params_inline
    }

    /// Whether multipart fields skip JSON encoding.
    #[must_use]
    pub const fn skips_form_data_stringify(&self) -> bool {
        self.no_form_data_stringify
    }
}

impl<P, D, R> Clone for EndpointDescriptor<P, D, R> {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            method: self.method,
            secure: self.secure,
            params_inline: self.params_inline.clone(),
            no_form_data_stringify: self.no_form_data_stringify,
            _shape: PhantomData,
        }
    }
}

impl<P, D, R> fmt::Debug for EndpointDescriptor<P, D, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointDescriptor")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("secure", &self.secure)
            .field("params_inline", &self.params_inline)
            .field("no_form_data_stringify", &self.no_form_data_stringify)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builder() {
        let endpoint: EndpointDescriptor = EndpointDescriptor::post("/files/:bucket")
            .secure()
            .inline_param("bucket")
            .no_form_data_stringify();

        assert_eq!(endpoint.method(), HttpMethod::Post);
        assert_eq!(endpoint.url(), "/files/:bucket");
        assert!(endpoint.is_secure());
        assert!(endpoint.params_inline().contains("bucket"));
        assert!(endpoint.skips_form_data_stringify());
    }

    #[test]
    fn test_defaults() {
        let endpoint: EndpointDescriptor = EndpointDescriptor::get("/health");
        assert!(!endpoint.is_secure());
        assert!(endpoint.params_inline().is_empty());
        assert!(!endpoint.skips_form_data_stringify());
    }
}
