//! Datasource lifecycle state types.
//!
//! This module defines the state machine of a datasource call,
//! enabling observers to display appropriate feedback at each stage:
//! - `Idle`: nothing loaded yet, or reset
//! - `Pending`: first call in flight, show a spinner
//! - `Refreshing`: call in flight while the previous response stays visible
//! - `Completed`: response received
//! - `Error`: call failed

use serde::{Deserialize, Serialize};

use crate::error::EndpointError;

/// Upload and download progress of the call in flight.
///
/// Flags only ever go from `false` to `true` within one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingData {
    /// Request body bytes have been sent.
    pub is_upload: bool,
    /// Upload percentage, 0 to 100.
    pub upload_progress: Option<u8>,
    /// Response body bytes have been received.
    pub is_download: bool,
    /// Download percentage, 0 to 100.
    pub download_progress: Option<u8>,
}

impl LoadingData {
    /// Records upload progress.
    pub fn record_upload(&mut self, progress: u8) {
        self.is_upload = true;
        self.upload_progress = Some(progress.min(100));
    }

    /// Records download progress.
    pub fn record_download(&mut self, progress: u8) {
        self.is_download = true;
        self.download_progress = Some(progress.min(100));
    }
}

/// Discriminator of [`DatasourceState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateTag {
    /// See [`DatasourceState::Idle`].
    Idle,
    /// See [`DatasourceState::Pending`].
    Pending,
    /// See [`DatasourceState::Refreshing`].
    Refreshing,
    /// See [`DatasourceState::Completed`].
    Completed,
    /// See [`DatasourceState::Error`].
    Error,
}

impl StateTag {
    /// Returns the tag as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Refreshing => "refreshing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

/// Lifecycle state of the current call of a datasource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
#[derive(Default)]
pub enum DatasourceState<R> {
    /// No call made yet, or reset.
    #[default]
    Idle,

    /// A call is in flight and there is no previous response to show.
    Pending {
        /// Progress of the call.
        #[serde(rename = "loadingData")]
        loading_data: LoadingData,
    },

    /// A call is in flight; the previous response is kept for display.
    Refreshing {
        /// Progress of the call.
        #[serde(rename = "loadingData")]
        loading_data: LoadingData,
        /// The last successful response.
        response: R,
    },

    /// The last call succeeded.
    Completed {
        /// The response.
        response: R,
    },

    /// The last call failed.
    Error {
        /// The normalized error.
        error: EndpointError,
    },
}

impl<R> DatasourceState<R> {
    /// Creates a fresh Pending state.
    #[must_use]
    pub fn pending() -> Self {
        Self::Pending {
            loading_data: LoadingData::default(),
        }
    }

    /// Creates a fresh Refreshing state around a previous response.
    #[must_use]
    pub fn refreshing(response: R) -> Self {
        Self::Refreshing {
            loading_data: LoadingData::default(),
            response,
        }
    }

    /// Creates a Completed state.
    #[must_use]
    pub const fn completed(response: R) -> Self {
        Self::Completed { response }
    }

    /// Creates an Error state.
    #[must_use]
    pub const fn error(error: EndpointError) -> Self {
        Self::Error { error }
    }

    /// Returns the discriminator.
    #[must_use]
    pub const fn tag(&self) -> StateTag {
        match self {
            Self::Idle => StateTag::Idle,
            Self::Pending { .. } => StateTag::Pending,
            Self::Refreshing { .. } => StateTag::Refreshing,
            Self::Completed { .. } => StateTag::Completed,
            Self::Error { .. } => StateTag::Error,
        }
    }

    /// Returns true if the state is Idle.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true if a call is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Pending { .. } | Self::Refreshing { .. })
    }

    /// Returns true if the last call succeeded.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Returns true if the last call failed.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Returns the response held by Completed or Refreshing.
    #[must_use]
    pub const fn response(&self) -> Option<&R> {
        match self {
            Self::Completed { response } | Self::Refreshing { response, .. } => Some(response),
            Self::Idle | Self::Pending { .. } | Self::Error { .. } => None,
        }
    }

    /// Returns the error if in Error state.
    #[must_use]
    pub const fn error_value(&self) -> Option<&EndpointError> {
        match self {
            Self::Error { error } => Some(error),
            _ => None,
        }
    }

    /// Returns the progress of the call in flight.
    #[must_use]
    pub const fn loading_data(&self) -> Option<&LoadingData> {
        match self {
            Self::Pending { loading_data } | Self::Refreshing { loading_data, .. } => {
                Some(loading_data)
            }
            Self::Idle | Self::Completed { .. } | Self::Error { .. } => None,
        }
    }

    /// Mutable access to the progress of the call in flight.
    pub const fn loading_data_mut(&mut self) -> Option<&mut LoadingData> {
        match self {
            Self::Pending { loading_data } | Self::Refreshing { loading_data, .. } => {
                Some(loading_data)
            }
            Self::Idle | Self::Completed { .. } | Self::Error { .. } => None,
        }
    }
}
