//! Request body decoding for analytics.
//!
//! A body is JSON when its `Content-Type` contains `application/json`;
//! otherwise it is kept as text. A JSON-flagged body that does not parse is
//! the only analytics failure the caller ever sees (the handler answers 400).

use axum::body::Bytes;
use axum::http::{header, HeaderMap};
use serde_json::Value;

/// Inbound body as captured for the analytics event.
#[derive(Debug, Clone, PartialEq)]
pub enum CapturedBody {
    Json(Value),
    Text(String),
}

impl CapturedBody {
    /// Decode `body` according to the request's content type.
    pub fn sniff(headers: &HeaderMap, body: &Bytes) -> Result<Self, serde_json::Error> {
        if is_json(headers) {
            serde_json::from_slice(body).map(CapturedBody::Json)
        } else {
            Ok(CapturedBody::Text(String::from_utf8_lossy(body).into_owned()))
        }
    }

    /// Compact JSON text of the captured value; text bodies become a JSON string literal.
    pub fn serialized(&self) -> String {
        match self {
            CapturedBody::Json(value) => value.to_string(),
            CapturedBody::Text(text) => Value::String(text.clone()).to_string(),
        }
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    // Repeated values are read as one comma-joined value.
    let joined = headers
        .get_all(header::CONTENT_TYPE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join(", ");
    joined.contains("application/json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers(content_type: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(ct) = content_type {
            headers.insert(header::CONTENT_TYPE, ct.parse().unwrap());
        }
        headers
    }

    #[test]
    fn test_json_body_is_parsed() {
        let body = Bytes::from_static(br#"{ "q" : "x" }"#);
        let captured = CapturedBody::sniff(&headers(Some("application/json; charset=utf-8")), &body).unwrap();

        assert_eq!(captured, CapturedBody::Json(json!({"q": "x"})));
        assert_eq!(captured.serialized(), r#"{"q":"x"}"#);
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let body = Bytes::from_static(b"{not json");
        assert!(CapturedBody::sniff(&headers(Some("application/json")), &body).is_err());
    }

    #[test]
    fn test_empty_json_body_is_rejected() {
        assert!(CapturedBody::sniff(&headers(Some("application/json")), &Bytes::new()).is_err());
    }

    #[test]
    fn test_non_json_content_type_is_text() {
        let body = Bytes::from_static(b"{not json");
        let captured = CapturedBody::sniff(&headers(Some("text/plain")), &body).unwrap();

        assert_eq!(captured, CapturedBody::Text("{not json".into()));
        assert_eq!(captured.serialized(), r#""{not json""#);
    }

    #[test]
    fn test_missing_content_type_is_text() {
        let captured = CapturedBody::sniff(&headers(None), &Bytes::new()).unwrap();
        assert_eq!(captured.serialized(), r#""""#);
    }

    #[test]
    fn test_content_type_match_is_substring() {
        let body = Bytes::from_static(b"[1,2]");
        let captured = CapturedBody::sniff(&headers(Some("application/json-patch+json")), &body).unwrap();
        assert_eq!(captured, CapturedBody::Json(json!([1, 2])));
    }

    #[test]
    fn test_repeated_content_type_values_are_joined() {
        let mut headers = HeaderMap::new();
        headers.append(header::CONTENT_TYPE, "text/plain".parse().unwrap());
        headers.append(header::CONTENT_TYPE, "application/json".parse().unwrap());

        let body = Bytes::from_static(br#"{"a":1}"#);
        let captured = CapturedBody::sniff(&headers, &body).unwrap();
        assert_eq!(captured, CapturedBody::Json(json!({"a": 1})));
    }
}
