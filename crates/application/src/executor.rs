//! Endpoint executor
//!
//! Turns an endpoint descriptor and call arguments into one cancellable
//! request, sends it through the injected [`HttpTransport`] and maps every
//! outcome to `Ok(response)` or an [`EndpointError`].

use std::fmt;
use std::sync::Arc;

use conduit_domain::endpoint::{CallArguments, EndpointDescriptor, query_params, resolve_url};
use conduit_domain::request::{ContentType, Headers, HttpMethod, PreparedRequest, ToRequestData};
use conduit_domain::{DomainResult, EndpointError, ErrorBody};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::{EndpointResult, from_domain_error};
use crate::ports::{
    AuthorizationHeadersProvider, HttpTransport, ProgressCallback, ProgressSink,
    TransportResponse,
};

/// Opaque handle aborting one in-flight call.
///
/// Cancelling twice, or cancelling a call that already finished, has no
/// effect.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Creates a handle for a new call.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Aborts the call.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns true once the call has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// Callback receiving the cancel handle of a call before it is sent.
pub type AssignCancel = Box<dyn FnOnce(CancelHandle) + Send>;

/// Per-call options of [`EndpointExecutor::execute`].
#[derive(Default)]
pub struct CallConfig {
    headers: Headers,
    assign_cancel: Option<AssignCancel>,
    cancel_handle: Option<CancelHandle>,
    on_upload_progress: Option<ProgressCallback>,
    on_download_progress: Option<ProgressCallback>,
    no_form_data_stringify: Option<bool>,
    override_url: Option<String>,
}

impl CallConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header, sent after the content type and before authorization.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Receives the cancel handle before the request is sent.
    #[must_use]
    pub fn assign_cancel(mut self, assign: impl FnOnce(CancelHandle) + Send + 'static) -> Self {
        self.assign_cancel = Some(Box::new(assign));
        self
    }

    /// Uses a caller-created cancel handle instead of a fresh one.
    #[must_use]
    pub fn cancel_handle(mut self, handle: CancelHandle) -> Self {
        self.cancel_handle = Some(handle);
        self
    }

    /// Receives upload percentages.
    #[must_use]
    pub fn on_upload_progress(mut self, callback: impl Fn(u8) + Send + Sync + 'static) -> Self {
        self.on_upload_progress = Some(Arc::new(callback));
        self
    }

    /// Receives download percentages.
    #[must_use]
    pub fn on_download_progress(mut self, callback: impl Fn(u8) + Send + Sync + 'static) -> Self {
        self.on_download_progress = Some(Arc::new(callback));
        self
    }

    /// Overrides the descriptor's multipart stringify setting.
    #[must_use]
    pub const fn no_form_data_stringify(mut self, value: bool) -> Self {
        self.no_form_data_stringify = Some(value);
        self
    }

    /// Replaces the descriptor's URL template for this call only.
    #[must_use]
    pub fn override_url(mut self, url: Option<String>) -> Self {
        self.override_url = url;
        self
    }
}

impl fmt::Debug for CallConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallConfig")
            .field("headers", &self.headers)
            .field("assign_cancel", &self.assign_cancel.is_some())
            .field("on_upload_progress", &self.on_upload_progress.is_some())
            .field("on_download_progress", &self.on_download_progress.is_some())
            .field("no_form_data_stringify", &self.no_form_data_stringify)
            .field("override_url", &self.override_url)
            .finish_non_exhaustive()
    }
}

/// Builds the request for one call, without authorization headers.
///
/// The URL template is taken from `url` (or the descriptor), placeholders
/// are substituted, remaining parameters go to the query string and the
/// body is encoded by shape. Unresolved placeholders are kept verbatim.
///
/// # Errors
///
/// Returns an error when the parameters or the body cannot be encoded.
pub fn prepare_request<P, D, R>(
    endpoint: &EndpointDescriptor<P, D, R>,
    args: &CallArguments<P, D>,
    url: Option<&str>,
    no_form_data_stringify: bool,
    extra_headers: &Headers,
) -> DomainResult<PreparedRequest>
where
    P: Serialize,
    D: ToRequestData,
{
    let params = args.params_map()?;
    let resolved = resolve_url(url.unwrap_or_else(|| endpoint.url()), &params);
    if !resolved.is_complete() {
        warn!(
            url = %resolved.url,
            unresolved = ?resolved.unresolved,
            "URL placeholders without parameters are sent verbatim"
        );
    }

    let encoded = args.request_data()?.encode(no_form_data_stringify)?;
    let content_type = if endpoint.method() == HttpMethod::Get {
        ContentType::PlainText
    } else {
        encoded.content_type
    };

    let mut request = PreparedRequest::new(endpoint.method(), resolved.url);
    request.query = query_params(&params, endpoint.params_inline(), &resolved.consumed);
    request.headers.set("Content-Type", content_type.as_str());
    request
        .headers
        .merge(extra_headers.iter().map(|h| (h.name.clone(), h.value.clone())));
    request.body = encoded.body;

    Ok(request)
}

/// Sends endpoint calls through a transport.
///
/// # Example
///
/// ```ignore
/// let executor = EndpointExecutor::new(Arc::new(ReqwestTransport::new(settings)?))
///     .with_authorization(Arc::new(StaticHeaders::bearer(token)));
///
/// let user: User = executor
///     .execute(&GET_USER, &CallArguments::with_params(UserId { id: 42 }), CallConfig::new())
///     .await?;
/// ```
pub struct EndpointExecutor<T> {
    transport: Arc<T>,
    authorization: Option<Arc<dyn AuthorizationHeadersProvider>>,
}

impl<T: HttpTransport> EndpointExecutor<T> {
    /// Creates an executor without authorization.
    pub const fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            authorization: None,
        }
    }

    /// Adds an authorization header provider, awaited on every call.
    #[must_use]
    pub fn with_authorization(mut self, provider: Arc<dyn AuthorizationHeadersProvider>) -> Self {
        self.authorization = Some(provider);
        self
    }

    /// Returns true if an authorization header provider is configured.
    #[must_use]
    pub const fn has_authorization(&self) -> bool {
        self.authorization.is_some()
    }

    /// Executes one call.
    ///
    /// Never fails with anything but an [`EndpointError`]:
    /// - secure endpoint without provider: `NoAuthorizationHeaderProvider` (403), nothing sent
    /// - cancellation: `AxiosCancelError` (449)
    /// - non-success status: status as `code`, details from the error body when present
    /// - anything else: `UnknownError` (500)
    ///
    /// # Errors
    ///
    /// Returns the normalized error of a failed call.
    pub async fn execute<P, D, R>(
        &self,
        endpoint: &EndpointDescriptor<P, D, R>,
        args: &CallArguments<P, D>,
        config: CallConfig,
    ) -> EndpointResult<R>
    where
        P: Serialize + Sync,
        D: ToRequestData + Sync,
        R: DeserializeOwned,
    {
        if endpoint.is_secure() && self.authorization.is_none() {
            debug!(url = endpoint.url(), "secure endpoint called without authorization provider");
            return Err(EndpointError::no_authorization_provider());
        }

        let CallConfig {
            headers,
            assign_cancel,
            cancel_handle,
            on_upload_progress,
            on_download_progress,
            no_form_data_stringify,
            override_url,
        } = config;

        let request = prepare_request(
            endpoint,
            args,
            override_url.as_deref(),
            no_form_data_stringify.unwrap_or_else(|| endpoint.skips_form_data_stringify()),
            &headers,
        )
        .map_err(|e| from_domain_error(&e))?;

        let handle = cancel_handle.unwrap_or_default();
        if let Some(assign) = assign_cancel {
            assign(handle.clone());
        }
        let token = handle.token();
        let progress = ProgressSink::new(on_upload_progress, on_download_progress)
            .until_cancelled(token.clone());

        debug!(method = %request.method, url = %request.url, "executing endpoint call");

        let outcome = tokio::select! {
            biased;
            () = token.cancelled() => Err(EndpointError::transport_cancelled()),
            result = self.send(request, progress) => result,
        };

        if token.is_cancelled() {
            trace!("endpoint call cancelled");
            return Err(EndpointError::transport_cancelled());
        }

        decode_response(outcome?)
    }

    async fn send(
        &self,
        mut request: PreparedRequest,
        progress: ProgressSink,
    ) -> EndpointResult<TransportResponse> {
        if let Some(provider) = &self.authorization {
            let headers = provider.headers().await.map_err(|e| {
                debug!(error = %e, "authorization header provider failed");
                EndpointError::from(e)
            })?;
            request.headers.merge(headers);
        }

        self.transport.send(request, progress).await.map_err(|e| {
            debug!(error = %e, "transport failed");
            EndpointError::from(e)
        })
    }
}

impl<T> Clone for EndpointExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            authorization: self.authorization.clone(),
        }
    }
}

impl<T> fmt::Debug for EndpointExecutor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointExecutor")
            .field("authorization", &self.authorization.is_some())
            .finish_non_exhaustive()
    }
}

/// Maps a transport response to the decoded body or an error.
fn decode_response<R: DeserializeOwned>(response: TransportResponse) -> EndpointResult<R> {
    if !response.is_success() {
        debug!(status = response.status, "endpoint call failed");
        return Err(EndpointError::from_response(
            Some(response.status),
            ErrorBody::parse(&response.body),
        ));
    }

    let body: &[u8] = if response.body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &response.body
    };

    serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "malformed response body");
        EndpointError::unknown_with_message(format!("Malformed response body: {e}"))
    })
}
