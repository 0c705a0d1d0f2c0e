//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `HttpTransport` port using the reqwest library.
//! It handles all network communication of the executor.

use std::future::Future;

use conduit_application::ports::{HttpTransport, ProgressSink, TransportResponse};
use conduit_application::TransportError;
use conduit_domain::request::{Header, Headers, HttpMethod, PreparedRequest};
use reqwest::{Client, Method, Response, Url};
use tracing::{debug, trace};

use crate::http::{BuiltBody, UploadCounter, build_body};
use crate::settings::TransportSettings;

/// HTTP transport implementation using reqwest.
///
/// Wraps `reqwest::Client` and implements the `HttpTransport` port from the
/// application layer. Relative request URLs are joined onto the configured
/// base URL.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Option<Url>,
}

impl ReqwestTransport {
    /// Creates a transport from settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(settings: &TransportSettings) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .connect_timeout(settings.connect_timeout())
            .redirect(reqwest::redirect::Policy::limited(settings.max_redirects))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
        })
    }

    /// Creates a transport with a custom reqwest client.
    #[must_use]
    pub const fn with_client(client: Client, base_url: Option<Url>) -> Self {
        Self { client, base_url }
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Builds the absolute URL of a request, query string included.
    fn request_url(&self, url: &str, query: &[(String, String)]) -> Result<Url, TransportError> {
        let mut parsed = match Url::parse(url) {
            Ok(absolute) => absolute,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_url.as_ref().ok_or_else(|| {
                    TransportError::InvalidUrl(format!("relative URL without base URL: {url}"))
                })?;
                Url::parse(&join_url(base.as_str(), url))
                    .map_err(|e| TransportError::InvalidUrl(format!("{e}: {url}")))?
            }
            Err(e) => return Err(TransportError::InvalidUrl(format!("{e}: {url}"))),
        };

        if !query.is_empty() {
            let encoded = serde_urlencoded::to_string(query)
                .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
            let combined = match parsed.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
                _ => encoded,
            };
            parsed.set_query(Some(&combined));
        }

        Ok(parsed)
    }

    /// Maps reqwest errors to `TransportError`.
    fn map_error(error: &reqwest::Error) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout;
        }

        if error.is_connect() {
            return TransportError::Connection(error.to_string());
        }

        if error.is_body() || error.is_decode() {
            return TransportError::Body(error.to_string());
        }

        if error.is_builder() {
            return TransportError::InvalidUrl(error.to_string());
        }

        TransportError::Other(error.to_string())
    }

    /// Reads the response body chunk by chunk, reporting download progress.
    async fn read_body(
        mut response: Response,
        progress: &ProgressSink,
    ) -> Result<Vec<u8>, TransportError> {
        let total = response.content_length();
        let mut body = Vec::with_capacity(
            total
                .and_then(|t| usize::try_from(t).ok())
                .unwrap_or_default(),
        );

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| TransportError::Body(format!("Failed to read body: {e}")))?
        {
            body.extend_from_slice(&chunk);
            progress.download(body.len() as u64, total);
        }

        Ok(body)
    }
}

/// Joins a relative URL onto a base URL, keeping the base path.
fn join_url(base: &str, url: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        url.trim_start_matches('/')
    )
}

fn response_headers(response: &Response) -> Headers {
    response
        .headers()
        .iter()
        .map(|(name, value)| Header::new(name.as_str(), value.to_str().unwrap_or("<binary>")))
        .collect()
}

impl HttpTransport for ReqwestTransport {
    fn send(
        &self,
        request: PreparedRequest,
        progress: ProgressSink,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send {
        Box::pin(async move {
            let PreparedRequest {
                method,
                url,
                query,
                headers,
                body,
            } = request;

            let url = self.request_url(&url, &query)?;
            let body =
                build_body(body, &progress).map_err(|e| TransportError::Body(e.to_string()))?;

            let mut builder = self.client.request(Self::to_reqwest_method(method), url);

            for header in headers.iter() {
                // reqwest sets the multipart content type itself, boundary included
                if body.is_multipart() && header.name.eq_ignore_ascii_case("content-type") {
                    continue;
                }
                builder = builder.header(&header.name, &header.value);
            }

            builder = match body {
                BuiltBody::None => builder,
                BuiltBody::Json(bytes) if progress.wants_upload() => {
                    let length = bytes.len();
                    builder
                        .header(reqwest::header::CONTENT_LENGTH, length)
                        .body(UploadCounter::new(length as u64, progress.clone()).body(bytes))
                }
                BuiltBody::Json(bytes) => builder.body(bytes),
                BuiltBody::Multipart(form) => builder.multipart(form),
            };

            debug!(%method, "sending request");
            let response = builder.send().await.map_err(|e| Self::map_error(&e))?;

            let status = response.status().as_u16();
            let headers = response_headers(&response);
            trace!(status, "response received");

            let body = Self::read_body(response, &progress).await?;

            Ok(TransportResponse {
                status,
                headers,
                body,
            })
        })
    }
}
