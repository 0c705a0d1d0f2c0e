//! HTTP request body builder.
//!
//! Turns the domain `PreparedBody` into something reqwest can send.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use conduit_application::ports::ProgressSink;
use conduit_domain::request::{FileAttachment, MultipartField, PreparedBody};
use futures::stream::{self, StreamExt};
use reqwest::Body;
use reqwest::multipart::{Form, Part};

/// Size of the chunks an observed upload is streamed in.
const UPLOAD_CHUNK_SIZE: usize = 16 * 1024;

/// Error type for body building operations.
#[derive(Debug, thiserror::Error)]
pub enum BodyBuildError {
    /// A file declared a MIME type reqwest rejects.
    #[error("Invalid MIME type {mime_type} for {file_name}: {message}")]
    InvalidMimeType {
        /// Name of the offending file.
        file_name: String,
        /// The rejected MIME type.
        mime_type: String,
        /// Error reported by reqwest.
        message: String,
    },
}

/// Result of building a body.
#[derive(Debug)]
pub enum BuiltBody {
    /// No body.
    None,
    /// Serialized JSON.
    Json(Vec<u8>),
    /// Multipart form data.
    Multipart(Form),
}

impl BuiltBody {
    /// Check if this is a multipart form.
    ///
    /// reqwest sets the content type of a form itself, boundary included.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }

    /// Check if this body is empty/none.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Counts request bytes handed to reqwest and reports them as upload progress.
///
/// One counter is shared by every streamed piece of a body, so the
/// percentage covers all of them against a single total.
#[derive(Debug, Clone)]
pub struct UploadCounter {
    sent: Arc<AtomicU64>,
    total: u64,
    progress: ProgressSink,
}

impl UploadCounter {
    /// Creates a counter for `total` bytes.
    #[must_use]
    pub fn new(total: u64, progress: ProgressSink) -> Self {
        Self {
            sent: Arc::new(AtomicU64::new(0)),
            total,
            progress,
        }
    }

    /// Wraps `bytes` in a chunked stream counting each chunk as it is polled.
    #[must_use]
    pub fn body(&self, bytes: Vec<u8>) -> Body {
        let chunks: Vec<Vec<u8>> = bytes
            .chunks(UPLOAD_CHUNK_SIZE)
            .map(<[u8]>::to_vec)
            .collect();

        let counter = self.clone();
        let stream = stream::iter(chunks).map(move |chunk| {
            let len = chunk.len() as u64;
            let sent = counter.sent.fetch_add(len, Ordering::SeqCst) + len;
            counter.progress.upload(sent, Some(counter.total));
            Ok::<_, io::Error>(chunk)
        });

        Body::wrap_stream(stream)
    }
}

/// Build a reqwest body from a prepared body.
///
/// When `progress` listens to uploads, file parts are streamed and
/// reported against the summed size of all files.
///
/// # Errors
///
/// Returns an error if a file part has an invalid MIME type.
pub fn build_body(
    body: PreparedBody,
    progress: &ProgressSink,
) -> Result<BuiltBody, BodyBuildError> {
    match body {
        PreparedBody::None => Ok(BuiltBody::None),
        PreparedBody::Json(bytes) => Ok(BuiltBody::Json(bytes)),
        PreparedBody::Multipart(fields) => {
            let counter = progress
                .wants_upload()
                .then(|| UploadCounter::new(file_bytes(&fields), progress.clone()));
            build_multipart_form(fields, counter.as_ref()).map(BuiltBody::Multipart)
        }
    }
}

/// Total size of the file parts of a form.
fn file_bytes(fields: &[MultipartField]) -> u64 {
    fields
        .iter()
        .map(|field| match field {
            MultipartField::File { file, .. } => file.content.len() as u64,
            MultipartField::Text { .. } => 0,
        })
        .sum()
}

/// Build a multipart form, keeping field order.
fn build_multipart_form(
    fields: Vec<MultipartField>,
    counter: Option<&UploadCounter>,
) -> Result<Form, BodyBuildError> {
    let mut form = Form::new();

    for field in fields {
        match field {
            MultipartField::Text { name, value } => {
                form = form.text(name, value);
            }
            MultipartField::File { name, file } => {
                form = form.part(name, file_part(file, counter)?);
            }
        }
    }

    Ok(form)
}

fn file_part(
    file: FileAttachment,
    counter: Option<&UploadCounter>,
) -> Result<Part, BodyBuildError> {
    let mime_type = file_mime_type(&file);
    let FileAttachment {
        file_name, content, ..
    } = file;

    let part = match counter {
        Some(counter) => {
            let length = content.len() as u64;
            Part::stream_with_length(counter.body(content), length)
        }
        None => Part::bytes(content),
    };

    part.file_name(file_name.clone())
        .mime_str(&mime_type)
        .map_err(|e| BodyBuildError::InvalidMimeType {
            file_name,
            mime_type,
            message: e.to_string(),
        })
}

/// Declared MIME type, else guessed from the file name.
fn file_mime_type(file: &FileAttachment) -> String {
    file.mime_type.clone().unwrap_or_else(|| {
        mime_guess::from_path(&file.file_name)
            .first_or_octet_stream()
            .to_string()
    })
}
