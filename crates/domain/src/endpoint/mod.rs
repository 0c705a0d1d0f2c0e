//! Endpoint description and call arguments

mod args;
mod descriptor;
mod template;

pub use args::CallArguments;
pub use descriptor::EndpointDescriptor;
pub use template::{ParamMap, ResolvedUrl, params_to_map, query_params, resolve_url};
