//! Scripted transport shared by the unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use conduit_domain::request::PreparedRequest;
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::error::TransportError;
use crate::ports::{HttpTransport, ProgressSink, TransportResponse};

/// Mock transport recording requests and replaying a fixed response.
pub struct MockTransport {
    response: Result<TransportResponse, TransportError>,
    echo_url: bool,
    progress: Vec<(u64, Option<u64>)>,
    gate: Option<Arc<Semaphore>>,
    delay: Option<Duration>,
    sent: Mutex<Vec<PreparedRequest>>,
    calls: AtomicUsize,
}

impl MockTransport {
    pub fn responding(status: u16, body: &Value) -> Self {
        Self::with_response(Ok(TransportResponse::new(status, body.to_string())))
    }

    pub fn with_response(response: Result<TransportResponse, TransportError>) -> Self {
        Self {
            response,
            echo_url: false,
            progress: Vec::new(),
            gate: None,
            delay: None,
            sent: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: TransportError) -> Self {
        Self::with_response(Err(error))
    }

    /// Answers 200 with the request URL as a JSON string.
    pub fn echoing_url() -> Self {
        Self {
            echo_url: true,
            ..Self::responding(200, &Value::Null)
        }
    }

    /// Reports `(loaded, total)` pairs for both directions before answering.
    pub fn with_progress(mut self, progress: Vec<(u64, Option<u64>)>) -> Self {
        self.progress = progress;
        self
    }

    /// Holds every call until a permit is added to `gate`.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> PreparedRequest {
        self.sent
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("a request was sent")
    }
}

impl HttpTransport for MockTransport {
    fn send(
        &self,
        request: PreparedRequest,
        progress: ProgressSink,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let url = request.url.clone();
        self.sent.lock().unwrap().push(request);

        Box::pin(async move {
            for (loaded, total) in &self.progress {
                progress.upload(*loaded, *total);
                progress.download(*loaded, *total);
            }
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.echo_url {
                return Ok(TransportResponse::new(200, Value::String(url).to_string()));
            }
            self.response.clone()
        })
    }
}
