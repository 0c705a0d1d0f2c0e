//! Call arguments

use serde::Serialize;

use super::template::{ParamMap, params_to_map};
use crate::error::DomainResult;
use crate::request::{RequestData, ToRequestData};

/// Arguments of one call: optional parameters and optional body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallArguments<P = (), D = ()> {
    /// Parameters, placed in the URL template or the query string.
    pub params: Option<P>,
    /// Body data.
    pub data: Option<D>,
}

impl<P, D> CallArguments<P, D> {
    /// Arguments for a parameterless endpoint.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            params: None,
            data: None,
        }
    }

    /// Arguments carrying only parameters.
    #[must_use]
    pub const fn with_params(params: P) -> Self {
        Self {
            params: Some(params),
            data: None,
        }
    }

    /// Arguments carrying only a body.
    #[must_use]
    pub const fn with_data(data: D) -> Self {
        Self {
            params: None,
            data: Some(data),
        }
    }

    /// Adds a body.
    #[must_use]
    pub fn data(mut self, data: D) -> Self {
        self.data = Some(data);
        self
    }
}

impl<P: Serialize, D> CallArguments<P, D> {
    /// Serializes the parameters.
    ///
    /// # Errors
    ///
    /// Returns an error when the parameters are not an object.
    pub fn params_map(&self) -> DomainResult<ParamMap> {
        self.params
            .as_ref()
            .map_or_else(|| Ok(ParamMap::new()), params_to_map)
    }
}

impl<P, D: ToRequestData> CallArguments<P, D> {
    /// Converts the body into request data; no body is `Null`.
    ///
    /// # Errors
    ///
    /// Returns an error when the body cannot be represented.
    pub fn request_data(&self) -> DomainResult<RequestData> {
        self.data.as_ref().map_or_else(
            || Ok(RequestData::Value(serde_json::Value::Null)),
            ToRequestData::to_request_data,
        )
    }
}

impl<P, D> Default for CallArguments<P, D> {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::request::Json;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Serialize)]
    struct Params {
        id: u32,
        expand: Option<bool>,
    }

    #[test]
    fn test_params_map() {
        let args: CallArguments<Params> = CallArguments::with_params(Params {
            id: 3,
            expand: None,
        });
        let map = args.params_map().unwrap();

        assert_eq!(map.get("id"), Some(&json!(3)));
        assert_eq!(map.get("expand"), Some(&serde_json::Value::Null));
    }

    #[test]
    fn test_absent_args() {
        let args: CallArguments<Params, Json<u8>> = CallArguments::none();
        assert!(args.params_map().unwrap().is_empty());
        assert_eq!(
            args.request_data().unwrap(),
            RequestData::Value(serde_json::Value::Null)
        );
    }

    #[test]
    fn test_request_data_from_json() {
        let args: CallArguments<(), Json<Vec<u8>>> = CallArguments::with_data(Json(vec![1, 2]));
        assert_eq!(
            args.request_data().unwrap(),
            RequestData::Value(json!([1, 2]))
        );
    }
}
