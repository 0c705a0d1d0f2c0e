//! Request body data and its encoding
//!
//! A call's body is described as [`RequestData`]: either a plain JSON value
//! or an ordered set of named fields, some of which may be files. Encoding
//! picks the wire representation from the shape of the data:
//!
//! | Data                         | Body            | Content-Type          |
//! |------------------------------|-----------------|-----------------------|
//! | null                         | none            | `text/plain`          |
//! | string / number / bool       | JSON scalar     | `application/json`    |
//! | object / array               | JSON            | `application/json`    |
//! | fields without files         | JSON object     | `application/json`    |
//! | fields with at least a file  | multipart form  | `multipart/form-data` |

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{DomainError, DomainResult};
use crate::value::value_to_text;

/// A file to upload as a multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    /// File name reported to the server.
    pub file_name: String,
    /// Explicit MIME type; guessed from the file name when absent.
    pub mime_type: Option<String>,
    /// Raw file content.
    pub content: Vec<u8>,
}

impl FileAttachment {
    /// Creates a file attachment without an explicit MIME type.
    #[must_use]
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: None,
            content: content.into(),
        }
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// One named field of a [`RequestData::Fields`] body.
#[derive(Debug, Clone, PartialEq)]
pub enum DataField {
    /// A JSON-representable value.
    Value(Value),
    /// A file.
    File(FileAttachment),
}

/// Body data of one call, before encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestData {
    /// Any JSON value. `Null` means "no body".
    Value(Value),
    /// Ordered named fields that may carry files.
    Fields(Vec<(String, DataField)>),
}

impl RequestData {
    /// Serializes any value into request data.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidBody`] if serialization fails.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> DomainResult<Self> {
        serde_json::to_value(value)
            .map(Self::Value)
            .map_err(|e| DomainError::InvalidBody(e.to_string()))
    }

    /// Starts an empty field set.
    #[must_use]
    pub const fn fields() -> Self {
        Self::Fields(Vec::new())
    }

    /// Appends a value field.
    ///
    /// An object value is turned into fields first; any other value is
    /// replaced by the new field set.
    #[must_use]
    pub fn field(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name.into(), DataField::Value(value.into()))
    }

    /// Appends a file field.
    #[must_use]
    pub fn file(self, name: impl Into<String>, file: FileAttachment) -> Self {
        self.push(name.into(), DataField::File(file))
    }

    fn push(self, name: String, field: DataField) -> Self {
        let mut fields = match self {
            Self::Fields(fields) => fields,
            Self::Value(Value::Object(map)) => map
                .into_iter()
                .map(|(key, value)| (key, DataField::Value(value)))
                .collect(),
            Self::Value(_) => Vec::new(),
        };
        fields.push((name, field));
        Self::Fields(fields)
    }

    /// Returns true if at least one field is a file.
    #[must_use]
    pub fn contains_files(&self) -> bool {
        match self {
            Self::Value(_) => false,
            Self::Fields(fields) => fields
                .iter()
                .any(|(_, field)| matches!(field, DataField::File(_))),
        }
    }

    /// Encodes the data for the wire.
    ///
    /// With `no_stringify`, non-file multipart fields are sent in their
    /// plain text form (`a`, `42`, `true`); otherwise they are JSON encoded
    /// (`"a"`, `42`, `true`). Null multipart fields are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidBody`] if JSON encoding fails.
    pub fn encode(self, no_stringify: bool) -> DomainResult<EncodedBody> {
        if self.contains_files() {
            return self.encode_multipart(no_stringify);
        }

        let value = match self {
            Self::Value(value) => value,
            Self::Fields(fields) => Value::Object(
                fields
                    .into_iter()
                    .filter_map(|(name, field)| match field {
                        DataField::Value(value) => Some((name, value)),
                        DataField::File(_) => None,
                    })
                    .collect::<Map<String, Value>>(),
            ),
        };

        if value.is_null() {
            return Ok(EncodedBody::empty());
        }

        let bytes = serde_json::to_vec(&value).map_err(|e| DomainError::InvalidBody(e.to_string()))?;
        Ok(EncodedBody {
            body: PreparedBody::Json(bytes),
            content_type: ContentType::Json,
        })
    }

    fn encode_multipart(self, no_stringify: bool) -> DomainResult<EncodedBody> {
        let Self::Fields(fields) = self else {
            return Err(DomainError::InvalidBody(
                "multipart encoding requires fields".to_string(),
            ));
        };

        let mut parts = Vec::with_capacity(fields.len());
        for (name, field) in fields {
            match field {
                DataField::File(file) => parts.push(MultipartField::File { name, file }),
                DataField::Value(Value::Null) => {}
                DataField::Value(value) => {
                    let text = if no_stringify {
                        value_to_text(&value).unwrap_or_default()
                    } else {
                        serde_json::to_string(&value).map_err(|e| {
                            DomainError::InvalidBody(format!("cannot stringify field {name}: {e}"))
                        })?
                    };
                    parts.push(MultipartField::Text { name, value: text });
                }
            }
        }

        Ok(EncodedBody {
            body: PreparedBody::Multipart(parts),
            content_type: ContentType::Multipart,
        })
    }
}

/// Conversion of a typed body into [`RequestData`].
///
/// Implemented for [`RequestData`] itself, [`serde_json::Value`], `()` and
/// [`Json`]. Bodies carrying files implement it by building
/// [`RequestData::fields`].
pub trait ToRequestData {
    /// Produces the body data for one call.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidBody`] if the body cannot be represented.
    fn to_request_data(&self) -> DomainResult<RequestData>;
}

impl ToRequestData for RequestData {
    fn to_request_data(&self) -> DomainResult<RequestData> {
        Ok(self.clone())
    }
}

impl ToRequestData for Value {
    fn to_request_data(&self) -> DomainResult<RequestData> {
        Ok(RequestData::Value(self.clone()))
    }
}

impl ToRequestData for () {
    fn to_request_data(&self) -> DomainResult<RequestData> {
        Ok(RequestData::Value(Value::Null))
    }
}

/// Wrapper sending any serializable type as body data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Json<T>(pub T);

impl<T: Serialize> ToRequestData for Json<T> {
    fn to_request_data(&self) -> DomainResult<RequestData> {
        RequestData::json(&self.0)
    }
}

/// Declared content type of an outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// `text/plain`
    PlainText,
    /// `application/json`
    Json,
    /// `multipart/form-data`
    Multipart,
}

impl ContentType {
    /// Returns the header value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlainText => "text/plain",
            Self::Json => "application/json",
            Self::Multipart => "multipart/form-data",
        }
    }
}

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartField {
    /// A text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// A file part.
    File {
        /// Field name.
        name: String,
        /// File content and metadata.
        file: FileAttachment,
    },
}

impl MultipartField {
    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Encoded body ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreparedBody {
    /// No body.
    #[default]
    None,
    /// JSON bytes.
    Json(Vec<u8>),
    /// Multipart form fields.
    Multipart(Vec<MultipartField>),
}

impl PreparedBody {
    /// Returns true if there is no body.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Result of encoding [`RequestData`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    /// The body.
    pub body: PreparedBody,
    /// The content type the body should be declared with.
    pub content_type: ContentType,
}

impl EncodedBody {
    /// No body, declared as plain text.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            body: PreparedBody::None,
            content_type: ContentType::PlainText,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_null_has_no_body() {
        let encoded = RequestData::Value(Value::Null).encode(false).unwrap();
        assert_eq!(encoded, EncodedBody::empty());
        assert_eq!(encoded.content_type.as_str(), "text/plain");
    }

    #[test]
    fn test_scalar_is_json_encoded() {
        let encoded = RequestData::json("hello").unwrap().encode(false).unwrap();
        assert_eq!(encoded.body, PreparedBody::Json(br#""hello""#.to_vec()));
        assert_eq!(encoded.content_type, ContentType::Json);

        let encoded = RequestData::json(&42).unwrap().encode(false).unwrap();
        assert_eq!(encoded.body, PreparedBody::Json(b"42".to_vec()));
    }

    #[test]
    fn test_object_round_trips_through_json() {
        let original = json!({"name": "a", "count": 3, "ratio": 0.5, "active": false});
        let encoded = RequestData::Value(original.clone()).encode(false).unwrap();

        let PreparedBody::Json(bytes) = encoded.body else {
            panic!("expected JSON body");
        };
        let decoded: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, original);
        assert!(decoded["count"].is_u64());
    }

    #[test]
    fn test_fields_without_files_are_json() {
        let data = RequestData::fields().field("name", "a").field("age", 7);
        let encoded = data.encode(false).unwrap();

        let PreparedBody::Json(bytes) = encoded.body else {
            panic!("expected JSON body");
        };
        let decoded: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, json!({"name": "a", "age": 7}));
    }

    #[test]
    fn test_fields_with_file_are_multipart() {
        let data = RequestData::fields()
            .field("name", "a")
            .field("skip", Value::Null)
            .file("file", FileAttachment::new("a.bin", vec![1, 2, 3]));
        let encoded = data.encode(false).unwrap();

        assert_eq!(encoded.content_type, ContentType::Multipart);
        assert_eq!(
            encoded.body,
            PreparedBody::Multipart(vec![
                MultipartField::Text {
                    name: "name".to_string(),
                    value: r#""a""#.to_string(),
                },
                MultipartField::File {
                    name: "file".to_string(),
                    file: FileAttachment::new("a.bin", vec![1, 2, 3]),
                },
            ])
        );
    }

    #[test]
    fn test_multipart_no_stringify_uses_plain_text() {
        let data = RequestData::fields()
            .field("name", "a")
            .field("tags", json!(["x"]))
            .file("file", FileAttachment::new("a.txt", b"hi".to_vec()));
        let PreparedBody::Multipart(parts) = data.encode(true).unwrap().body else {
            panic!("expected multipart body");
        };

        assert_eq!(
            parts[0],
            MultipartField::Text {
                name: "name".to_string(),
                value: "a".to_string(),
            }
        );
        assert_eq!(
            parts[1],
            MultipartField::Text {
                name: "tags".to_string(),
                value: r#"["x"]"#.to_string(),
            }
        );
    }

    #[test]
    fn test_field_on_object_value_keeps_existing_keys() {
        let data = RequestData::Value(json!({"a": 1})).field("b", 2);
        assert!(!data.contains_files());
        let PreparedBody::Json(bytes) = data.encode(false).unwrap().body else {
            panic!("expected JSON body");
        };
        let decoded: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_json_wrapper() {
        #[derive(Serialize)]
        struct Body {
            title: String,
        }

        let data = Json(Body {
            title: "t".to_string(),
        })
        .to_request_data()
        .unwrap();
        assert_eq!(data, RequestData::Value(json!({"title": "t"})));
        assert_eq!(().to_request_data().unwrap(), RequestData::Value(Value::Null));
    }
}
