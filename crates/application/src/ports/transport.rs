//! HTTP transport port

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use conduit_domain::request::{Headers, PreparedRequest};
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;

/// Port for sending prepared requests over the network.
///
/// This trait abstracts the HTTP library, allowing the executor to be
/// independent of it and tests to substitute a scripted transport.
pub trait HttpTransport: Send + Sync {
    /// Sends the request and returns the response, whatever its status.
    ///
    /// Implementations report body transfer through `progress`. Dropping the
    /// returned future must abort the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be completed.
    fn send(
        &self,
        request: PreparedRequest,
        progress: ProgressSink,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

/// Raw response of a transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Headers,
    /// Response body.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Creates a response without headers.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Callback receiving a progress percentage between 0 and 100.
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Converts byte counts to a rounded percentage.
///
/// Returns `None` when the total is unknown or zero.
#[must_use]
pub fn progress_percentage(loaded: u64, total: Option<u64>) -> Option<u8> {
    let total = u128::from(total.filter(|t| *t > 0)?);
    let loaded = u128::from(loaded).min(total);
    let rounded = (loaded * 100 + total / 2) / total;
    u8::try_from(rounded).ok()
}

/// Receives raw byte counts from a transport and forwards percentages.
///
/// Nothing is forwarded once the call has been cancelled, or while the
/// total size is unknown.
#[derive(Clone, Default)]
pub struct ProgressSink {
    upload: Option<ProgressCallback>,
    download: Option<ProgressCallback>,
    cancel: Option<CancellationToken>,
}

impl ProgressSink {
    /// Creates a sink from optional callbacks.
    #[must_use]
    pub fn new(upload: Option<ProgressCallback>, download: Option<ProgressCallback>) -> Self {
        Self {
            upload,
            download,
            cancel: None,
        }
    }

    /// Silences the sink once `token` is cancelled.
    #[must_use]
    pub fn until_cancelled(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Returns true if someone listens to upload progress.
    #[must_use]
    pub const fn wants_upload(&self) -> bool {
        self.upload.is_some()
    }

    /// Returns true if someone listens to download progress.
    #[must_use]
    pub const fn wants_download(&self) -> bool {
        self.download.is_some()
    }

    /// Reports request body bytes sent so far.
    pub fn upload(&self, loaded: u64, total: Option<u64>) {
        self.emit(self.upload.as_ref(), loaded, total);
    }

    /// Reports response body bytes received so far.
    pub fn download(&self, loaded: u64, total: Option<u64>) {
        self.emit(self.download.as_ref(), loaded, total);
    }

    fn emit(&self, callback: Option<&ProgressCallback>, loaded: u64, total: Option<u64>) {
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return;
        }
        let Some(callback) = callback else {
            return;
        };
        if let Some(percentage) = progress_percentage(loaded, total) {
            callback(percentage);
        }
    }
}

impl fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressSink")
            .field("upload", &self.upload.is_some())
            .field("download", &self.download.is_some())
            .finish_non_exhaustive()
    }
}
