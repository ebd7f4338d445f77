use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// Pulls the permitted attributes out of `{ "<key>": { ... } }`.
///
/// A missing, null or empty root is rejected the same way, before any
/// field validation runs.
pub fn require<T: DeserializeOwned>(body: Value, key: &str) -> Result<T, ApiError> {
    let root = match body {
        Value::Object(mut map) => map.remove(key),
        _ => None,
    };

    match root {
        Some(Value::Object(attrs)) if !attrs.is_empty() => serde_json::from_value(Value::Object(attrs))
            .map_err(|e| ApiError::bad_request(format!("invalid {} parameters: {}", key, e))),
        Some(Value::Object(_)) | Some(Value::Null) | None => Err(ApiError::param_missing(key)),
        Some(_) => Err(ApiError::bad_request(format!("{} must be an object", key))),
    }
}

/// Integer query parameter; blank counts as absent.
pub fn integer(name: &str, raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("{} must be an integer", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::ProductParams;
    use serde_json::json;

    #[test]
    fn extracts_the_root_object() {
        let params: ProductParams = require(json!({ "product": { "title": "TV" } }), "product").unwrap();
        assert_eq!(params.title, Some(Some("TV".to_string())));
    }

    #[test]
    fn missing_or_empty_root_is_param_missing() {
        for body in [json!({}), json!({ "product": {} }), json!({ "product": null }), json!([1])] {
            let err = require::<ProductParams>(body, "product").unwrap_err();
            assert_eq!(err.to_json(), json!({ "errors": "param is missing or the value is empty: product" }));
        }
    }

    #[test]
    fn wrongly_typed_attributes_are_bad_requests() {
        let err = require::<ProductParams>(json!({ "product": { "published": "maybe" } }), "product").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        let err = require::<ProductParams>(json!({ "product": "TV" }), "product").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn parses_integers_leniently_about_blanks() {
        assert_eq!(integer("page", None).unwrap(), None);
        assert_eq!(integer("page", Some(" ")).unwrap(), None);
        assert_eq!(integer("page", Some("3")).unwrap(), Some(3));
        assert!(integer("page", Some("three")).is_err());
    }
}
