//! HTTP Request domain types

mod body;
mod header;
mod method;
mod prepared;

pub use body::{
    ContentType, DataField, EncodedBody, FileAttachment, Json, MultipartField, PreparedBody,
    RequestData, ToRequestData,
};
pub use header::{Header, Headers};
pub use method::HttpMethod;
pub use prepared::PreparedRequest;
