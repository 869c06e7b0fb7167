//! The normalized success shape and pagination cursor extraction.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

/// Base for resolving relative pagination URLs such as `/v1/widgets?cursor=x`.
/// Only the query string is read, so the host never matters.
const RELATIVE_BASE: &str = "http://relative.invalid/";

/// Pagination cursors lifted out of `meta.next` and `meta.previous`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub next: Option<String>,
    pub previous: Option<String>,
}

/// The only success shape handed to callers.
///
/// `data` is `None` when the envelope carried neither `object` nor
/// `objects`, and `Some(Value::Null)` when one of them was an explicit JSON
/// `null`. The two are kept apart on purpose.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub meta: PageMeta,
}

impl NormalizedResult {
    /// Deserialize `data` into a caller type. Absent data stays `None`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        self.data.clone().map(serde_json::from_value).transpose()
    }

    pub fn has_next(&self) -> bool {
        self.meta.next.is_some()
    }
}

/// Pull the `cursor` query parameter out of a pagination URL.
///
/// Non-string values, unparseable URLs, a missing parameter and an empty
/// parameter all yield `None`. Repeated parameters resolve to the first.
pub fn extract_cursor(value: Option<&Value>) -> Option<String> {
    let raw = value?.as_str()?;
    let base = Url::parse(RELATIVE_BASE).ok()?;
    let url = Url::options().base_url(Some(&base)).parse(raw).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "cursor")
        .map(|(_, cursor)| cursor.into_owned())
        .filter(|cursor| !cursor.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cursor_from_absolute_url() {
        let url = json!("https://api.example.com/v1/widgets?limit=10&cursor=abc123");
        assert_eq!(extract_cursor(Some(&url)).as_deref(), Some("abc123"));
    }

    #[test]
    fn cursor_from_relative_url() {
        let url = json!("/v1/widgets?cursor=page-2");
        assert_eq!(extract_cursor(Some(&url)).as_deref(), Some("page-2"));
    }

    #[test]
    fn cursor_is_query_decoded() {
        let url = json!("https://api.example.com/v1/widgets?cursor=a%2Fb+c");
        assert_eq!(extract_cursor(Some(&url)).as_deref(), Some("a/b c"));
    }

    #[test]
    fn missing_or_empty_cursor_is_none() {
        assert_eq!(extract_cursor(Some(&json!("https://api.example.com/v1/widgets?limit=5"))), None);
        assert_eq!(extract_cursor(Some(&json!("https://api.example.com/v1/widgets?cursor="))), None);
    }

    #[test]
    fn non_string_field_is_none() {
        assert_eq!(extract_cursor(None), None);
        assert_eq!(extract_cursor(Some(&Value::Null)), None);
        assert_eq!(extract_cursor(Some(&json!(42))), None);
        assert_eq!(extract_cursor(Some(&json!({"cursor": "x"}))), None);
    }

    #[test]
    fn absent_data_is_skipped_when_serialized() {
        let result = NormalizedResult {
            data: None,
            meta: PageMeta::default(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json["meta"], json!({"next": null, "previous": null}));
    }

    #[test]
    fn data_as_deserializes_objects() {
        let result = NormalizedResult {
            data: Some(json!([1, 2, 3])),
            meta: PageMeta::default(),
        };
        let numbers: Option<Vec<u32>> = result.data_as().unwrap();
        assert_eq!(numbers, Some(vec![1, 2, 3]));
        assert!(!result.has_next());
    }
}
