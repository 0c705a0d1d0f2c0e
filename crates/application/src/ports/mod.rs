//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod authorization;
mod transport;

pub use authorization::{
    AuthorizationFuture, AuthorizationHeaders, AuthorizationHeadersProvider, StaticHeaders,
};
pub use transport::{
    HttpTransport, ProgressCallback, ProgressSink, TransportResponse, progress_percentage,
};
