//! URL template resolution and query parameter placement
//!
//! Templates mark parameters with a colon: `/users/:id/posts/:postId`.
//! A placeholder name starts with an ASCII letter or underscore, so the
//! port in `http://host:8080` is never mistaken for one.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{DomainError, DomainResult};
use crate::value::value_to_text;

#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex"));

/// Parameters of one call, keyed by name.
pub type ParamMap = Map<String, Value>;

/// A template with its placeholders substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    /// The resulting URL.
    pub url: String,
    /// Parameters that were substituted into the URL.
    pub consumed: BTreeSet<String>,
    /// Placeholders left in place because no usable parameter was supplied.
    pub unresolved: Vec<String>,
}

impl ResolvedUrl {
    /// Returns true if every placeholder was substituted.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::is_empty is not const in stable
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Serializes call parameters into a name/value map.
///
/// Unit and `None` produce an empty map.
///
/// # Errors
///
/// Returns [`DomainError::InvalidParams`] when the parameters serialize to
/// anything other than an object or null.
pub fn params_to_map<P: Serialize + ?Sized>(params: &P) -> DomainResult<ParamMap> {
    match serde_json::to_value(params).map_err(|e| DomainError::InvalidParams(e.to_string()))? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(DomainError::InvalidParams(format!(
            "expected an object, got {other}"
        ))),
    }
}

/// Substitutes every `:name` placeholder that has a non-null parameter.
///
/// Placeholders without a parameter are left untouched and reported in
/// [`ResolvedUrl::unresolved`].
#[must_use]
pub fn resolve_url(template: &str, params: &ParamMap) -> ResolvedUrl {
    let mut consumed = BTreeSet::new();
    let mut unresolved = Vec::new();

    let url = PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[1];
            match params.get(name).and_then(value_to_text) {
                Some(text) => {
                    consumed.insert(name.to_string());
                    text
                }
                None => {
                    unresolved.push(name.to_string());
                    caps[0].to_string()
                }
            }
        })
        .into_owned();

    ResolvedUrl {
        url,
        consumed,
        unresolved,
    }
}

/// Collects the parameters that are sent as query string pairs.
///
/// Parameters consumed by the URL template and parameters declared inline
/// are excluded; null values are skipped.
#[must_use]
pub fn query_params(
    params: &ParamMap,
    inline: &BTreeSet<String>,
    consumed: &BTreeSet<String>,
) -> Vec<(String, String)> {
    params
        .iter()
        .filter(|(name, _)| !inline.contains(*name) && !consumed.contains(*name))
        .filter_map(|(name, value)| value_to_text(value).map(|text| (name.clone(), text)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn map(value: Value) -> ParamMap {
        params_to_map(&value).unwrap()
    }

    #[test]
    fn test_resolve_single_placeholder() {
        let params = map(json!({"id": 42}));
        let resolved = resolve_url("/users/:id", &params);

        assert_eq!(resolved.url, "/users/42");
        assert!(resolved.is_complete());
        assert!(resolved.consumed.contains("id"));
        assert!(query_params(&params, &BTreeSet::new(), &resolved.consumed).is_empty());
    }

    #[test]
    fn test_resolve_repeated_and_mixed_values() {
        let params = map(json!({"org": "acme", "flag": true, "id": 7}));
        let resolved = resolve_url("/:org/items/:id/:flag/:id", &params);

        assert_eq!(resolved.url, "/acme/items/7/true/7");
        assert!(!resolved.url.contains(':'));
    }

    #[test]
    fn test_port_is_not_a_placeholder() {
        let params = map(json!({"id": 1}));
        let resolved = resolve_url("http://localhost:8080/users/:id", &params);
        assert_eq!(resolved.url, "http://localhost:8080/users/1");
    }

    #[test]
    fn test_missing_or_null_param_is_left_in_place() {
        let params = map(json!({"id": null}));
        let resolved = resolve_url("/users/:id/:tab", &params);

        assert_eq!(resolved.url, "/users/:id/:tab");
        assert_eq!(resolved.unresolved, vec!["id".to_string(), "tab".to_string()]);
        assert!(resolved.consumed.is_empty());
    }

    #[test]
    fn test_object_param_is_json() {
        let params = map(json!({"filter": {"a": 1}}));
        let resolved = resolve_url("/search/:filter", &params);
        assert_eq!(resolved.url, r#"/search/{"a":1}"#);
    }

    #[test]
    fn test_query_excludes_consumed_and_inline() {
        let params = map(json!({
            "id": 1,
            "page": 2,
            "q": "rust",
            "tenant": "t1",
            "tags": ["a", "b"],
            "empty": null
        }));
        let resolved = resolve_url("/items/:id", &params);
        let inline = BTreeSet::from(["tenant".to_string()]);

        let query = query_params(&params, &inline, &resolved.consumed);
        assert_eq!(
            query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("q".to_string(), "rust".to_string()),
                ("tags".to_string(), r#"["a","b"]"#.to_string()),
            ]
        );
    }

    #[test]
    fn test_params_must_be_an_object() {
        assert!(params_to_map(&()).unwrap().is_empty());
        assert!(params_to_map(&Option::<u8>::None).unwrap().is_empty());
        assert!(matches!(
            params_to_map(&[1, 2]),
            Err(DomainError::InvalidParams(_))
        ));
    }
}
