//! Conduit Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer.

pub mod adapters;
pub mod http;
pub mod settings;

pub use adapters::ReqwestTransport;
pub use http::{BodyBuildError, BuiltBody, UploadCounter, build_body};
pub use settings::{SettingsError, TransportSettings};
