//! HTTP infrastructure utilities.
//!
//! This module provides body building for the reqwest transport.

mod body_builder;

pub use body_builder::{BodyBuildError, BuiltBody, UploadCounter, build_body};
