//! Conduit Domain - Core types
//!
//! This crate defines the domain model for typed endpoint calls:
//! endpoint descriptors, call arguments, body encoding, the normalized
//! endpoint error and the datasource lifecycle state.
//! All types here are pure Rust with no I/O dependencies.

pub mod endpoint;
pub mod error;
pub mod request;
pub mod state;
pub mod value;

pub use endpoint::{CallArguments, EndpointDescriptor};
pub use error::{DomainError, DomainResult, EndpointError, ErrorBody};
pub use state::{DatasourceState, LoadingData, StateTag};
