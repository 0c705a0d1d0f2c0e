//! Conduit Application - Endpoint executor and datasource
//!
//! This crate defines the application layer with:
//! - Port traits (transport and authorization headers)
//! - The endpoint executor turning descriptors into cancellable calls
//! - The datasource state machine tracking the lifecycle of those calls

pub mod datasource;
pub mod error;
pub mod executor;
pub mod ports;

#[cfg(test)]
mod test_support;

pub use datasource::{
    CancelOptions, ChangeDetector, Datasource, DatasourceConfig, LoadOptions,
};
pub use error::{AuthorizationError, EndpointResult, TransportError};
pub use executor::{AssignCancel, CallConfig, CancelHandle, EndpointExecutor, prepare_request};
pub use ports::{AuthorizationHeadersProvider, HttpTransport, StaticHeaders};
