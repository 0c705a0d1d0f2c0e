//! Datasource state machine
//!
//! A [`Datasource`] wraps repeated calls of one endpoint. It owns the
//! current [`DatasourceState`], keeps at most one call in flight and
//! publishes snapshots to observers through a `watch` channel.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use conduit_domain::endpoint::{CallArguments, EndpointDescriptor};
use conduit_domain::request::ToRequestData;
use conduit_domain::{DatasourceState, EndpointError, LoadingData};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::executor::{CallConfig, CancelHandle, EndpointExecutor};
use crate::ports::HttpTransport;

/// Decides whether a transition is published to observers.
///
/// Receives the previous and the next state.
pub type ChangeDetector<R> =
    Arc<dyn Fn(&DatasourceState<R>, &DatasourceState<R>) -> bool + Send + Sync>;

/// Datasource construction options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasourceConfig {
    /// Retain the arguments of the most recent `load`.
    pub keep_last_args: bool,
}

/// Options of one `load`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Show the previous response as `Refreshing` while loading.
    pub keep_state: bool,
    /// URL template used instead of the descriptor's for this call.
    pub override_url: Option<String>,
}

impl LoadOptions {
    /// Options of a refresh keeping the previous response.
    #[must_use]
    pub fn keep_state() -> Self {
        Self {
            keep_state: true,
            override_url: None,
        }
    }
}

/// Options of an explicit cancel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CancelOptions {
    /// Move a loading state to a terminal one.
    pub update_state: bool,
    /// When refreshing, go back to the previous response instead of an error.
    pub keep_response: bool,
}

struct Inner<R> {
    state: DatasourceState<R>,
    cancel: Option<CancelHandle>,
    change_detector: ChangeDetector<R>,
}

struct Shared<R> {
    inner: Mutex<Inner<R>>,
    /// Copy of `inner.state` readable while `inner` is held.
    current: Mutex<DatasourceState<R>>,
    sender: watch::Sender<DatasourceState<R>>,
}

impl<R: Clone> Shared<R> {
    fn lock(&self) -> MutexGuard<'_, Inner<R>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current(&self) -> MutexGuard<'_, DatasourceState<R>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the state and notifies observers if the detector fires.
    ///
    /// The detector runs before `current` is updated.
    fn transition(&self, inner: &mut Inner<R>, next: DatasourceState<R>) {
        let changed = (inner.change_detector)(&inner.state, &next);
        trace!(from = inner.state.tag().as_str(), to = next.tag().as_str(), changed, "transition");
        inner.state = next;
        *self.current() = inner.state.clone();
        if changed {
            self.sender.send_replace(inner.state.clone());
        }
    }

    /// Applies progress of the call owning `handle`, if it is still current.
    fn record_progress(&self, handle: &CancelHandle, update: impl FnOnce(&mut LoadingData)) {
        if handle.is_cancelled() {
            return;
        }
        let mut inner = self.lock();
        let mut next = inner.state.clone();
        let Some(loading_data) = next.loading_data_mut() else {
            return;
        };
        update(loading_data);
        self.transition(&mut inner, next);
    }
}

fn default_change_detector<R>() -> ChangeDetector<R> {
    Arc::new(|previous: &DatasourceState<R>, next: &DatasourceState<R>| {
        previous.tag() != next.tag()
    })
}

/// Lifecycle wrapper around repeated calls of one endpoint.
///
/// ```ignore
/// let users = Datasource::new(EndpointDescriptor::get("/users"), executor);
/// let mut states = users.subscribe();
///
/// users.load(CallArguments::none()).await;
/// assert!(users.state().is_completed());
/// ```
pub struct Datasource<T, P = (), D = (), R = serde_json::Value> {
    endpoint: EndpointDescriptor<P, D, R>,
    executor: EndpointExecutor<T>,
    config: DatasourceConfig,
    last_args: Mutex<Option<Arc<CallArguments<P, D>>>>,
    shared: Arc<Shared<R>>,
}

impl<T, P, D, R> Datasource<T, P, D, R>
where
    T: HttpTransport,
    P: Serialize + Send + Sync,
    D: ToRequestData + Send + Sync,
    R: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Creates an idle datasource with the default configuration.
    pub fn new(endpoint: EndpointDescriptor<P, D, R>, executor: EndpointExecutor<T>) -> Self {
        Self::with_config(endpoint, executor, DatasourceConfig::default())
    }

    /// Creates an idle datasource.
    pub fn with_config(
        endpoint: EndpointDescriptor<P, D, R>,
        executor: EndpointExecutor<T>,
        config: DatasourceConfig,
    ) -> Self {
        let (sender, _) = watch::channel(DatasourceState::Idle);
        Self {
            endpoint,
            executor,
            config,
            last_args: Mutex::new(None),
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: DatasourceState::Idle,
                    cancel: None,
                    change_detector: default_change_detector(),
                }),
                current: Mutex::new(DatasourceState::Idle),
                sender,
            }),
        }
    }

    /// Replaces the change detector deciding which transitions are published.
    ///
    /// The detector runs during the transition. It may read
    /// [`Datasource::state`], which still returns the previous state, but
    /// must not start or cancel calls on this datasource.
    #[must_use]
    pub fn with_change_detector(
        self,
        detector: impl Fn(&DatasourceState<R>, &DatasourceState<R>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.shared.lock().change_detector = Arc::new(detector);
        self
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> DatasourceState<R> {
        self.shared.current().clone()
    }

    /// Returns a receiver of published states.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DatasourceState<R>> {
        self.shared.sender.subscribe()
    }

    /// Returns the endpoint descriptor.
    #[must_use]
    pub const fn endpoint(&self) -> &EndpointDescriptor<P, D, R> {
        &self.endpoint
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> DatasourceConfig {
        self.config
    }

    /// Returns the arguments of the most recent `load` when retained.
    #[must_use]
    pub fn last_args(&self) -> Option<Arc<CallArguments<P, D>>> {
        self.last_args
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns true while a call is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.shared.current().is_loading()
    }

    /// Loads with default options; see [`Datasource::load_with`].
    pub async fn load(&self, args: CallArguments<P, D>) {
        self.load_with(args, LoadOptions::default()).await;
    }

    /// Loads keeping the previous response visible as `Refreshing`.
    pub async fn refresh(&self, args: CallArguments<P, D>) {
        self.load_with(args, LoadOptions::keep_state()).await;
    }

    /// Starts a call, replacing any call in flight.
    ///
    /// Resolves once the call settled. The outcome is only observable
    /// through the state: nothing is returned and nothing escapes.
    pub async fn load_with(&self, args: CallArguments<P, D>, options: LoadOptions) {
        let args = Arc::new(args);
        *self
            .last_args
            .lock()
            .unwrap_or_else(PoisonError::into_inner) =
            self.config.keep_last_args.then(|| Arc::clone(&args));

        let handle = CancelHandle::new();
        {
            let mut inner = self.shared.lock();
            if let Some(previous) = inner.cancel.replace(handle.clone()) {
                trace!("superseding call in flight");
                previous.cancel();
            }
            let next = match inner.state.response() {
                Some(response) if options.keep_state => {
                    DatasourceState::refreshing(response.clone())
                }
                _ => DatasourceState::pending(),
            };
            self.shared.transition(&mut inner, next);
        }

        let config = self.call_config(&handle, options.override_url);
        let result = self.executor.execute(&self.endpoint, &args, config).await;

        let mut inner = self.shared.lock();
        if handle.is_cancelled() {
            trace!("dropping outcome of cancelled call");
            return;
        }
        inner.cancel = None;
        if !inner.state.is_loading() {
            return;
        }
        match result {
            Ok(response) => self.shared.transition(&mut inner, DatasourceState::completed(response)),
            Err(error) if error.is_transport_cancel() => {
                trace!("call cancelled by transport");
            }
            Err(error) => {
                debug!(
                    url = self.endpoint.url(),
                    code = error.code,
                    error_code = %error.error_code,
                    "endpoint call failed"
                );
                self.shared.transition(&mut inner, DatasourceState::error(error));
            }
        }
    }

    /// Aborts the call in flight.
    ///
    /// Without options only the network call is aborted and the state is
    /// left as is. With `update_state`, a loading state becomes
    /// `Error(RequestCanceled)`, or `Completed` with the previous response
    /// when refreshing with `keep_response`.
    pub fn cancel(&self, options: Option<CancelOptions>) {
        let mut inner = self.shared.lock();
        if let Some(handle) = inner.cancel.take() {
            handle.cancel();
        }

        let Some(options) = options.filter(|o| o.update_state) else {
            return;
        };
        let next = match &inner.state {
            DatasourceState::Refreshing { response, .. } if options.keep_response => {
                DatasourceState::completed(response.clone())
            }
            DatasourceState::Pending { .. } | DatasourceState::Refreshing { .. } => {
                DatasourceState::error(EndpointError::request_canceled())
            }
            _ => return,
        };
        self.shared.transition(&mut inner, next);
    }

    /// Cancels any call in flight and returns to `Idle`.
    pub fn reset(&self) {
        self.cancel(None);
        let mut inner = self.shared.lock();
        self.shared.transition(&mut inner, DatasourceState::Idle);
    }

    fn call_config(&self, handle: &CancelHandle, override_url: Option<String>) -> CallConfig {
        let upload = (Arc::downgrade(&self.shared), handle.clone());
        let download = (Arc::downgrade(&self.shared), handle.clone());

        CallConfig::new()
            .cancel_handle(handle.clone())
            .override_url(override_url)
            .on_upload_progress(move |percentage| {
                progress(&upload.0, &upload.1, |data| data.record_upload(percentage));
            })
            .on_download_progress(move |percentage| {
                progress(&download.0, &download.1, |data| data.record_download(percentage));
            })
    }
}

fn progress<R: Clone>(
    shared: &Weak<Shared<R>>,
    handle: &CancelHandle,
    update: impl FnOnce(&mut LoadingData),
) {
    if let Some(shared) = shared.upgrade() {
        shared.record_progress(handle, update);
    }
}

impl<T, P, D, R> Drop for Datasource<T, P, D, R> {
    fn drop(&mut self) {
        let inner = self.shared.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = &inner.cancel {
            handle.cancel();
        }
    }
}

impl<T, P, D, R: fmt::Debug> fmt::Debug for Datasource<T, P, D, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.shared.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Datasource")
            .field("endpoint", &self.endpoint)
            .field("config", &self.config)
            .field("state", &inner.state)
            .finish_non_exhaustive()
    }
}
