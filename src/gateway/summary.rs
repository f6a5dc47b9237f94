//! Decoding of `POST /summary` responses.
//!
//! The Gateway answers with either JSON (a bare string or an object carrying
//! `summary`) or plain text. The declared `Content-Type` picks the branch; the
//! body is never sniffed.

use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use serde_json::Value;

use super::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Text,
}

impl ContentKind {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ct = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        Self::from_content_type(ct)
    }

    pub fn from_content_type(ct: &str) -> Self {
        if ct.to_ascii_lowercase().contains("application/json") {
            ContentKind::Json
        } else {
            ContentKind::Text
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SummaryPayload {
    Structured(Value),
    Text(String),
}

impl SummaryPayload {
    pub fn decode(kind: ContentKind, body: Bytes) -> Result<Self, GatewayError> {
        match kind {
            ContentKind::Json => serde_json::from_slice(&body)
                .map(SummaryPayload::Structured)
                .map_err(|source| GatewayError::Decode {
                    endpoint: "/summary",
                    source,
                }),
            ContentKind::Text => Ok(SummaryPayload::Text(
                String::from_utf8_lossy(&body).into_owned(),
            )),
        }
    }

    /// Text shown in the summary slot. Structured payloads that are neither a
    /// string nor carry a non-empty `summary` string fall back to their JSON
    /// encoding.
    pub fn into_text(self) -> String {
        match self {
            SummaryPayload::Text(text) => text,
            SummaryPayload::Structured(Value::String(text)) => text,
            SummaryPayload::Structured(value) => match value.get("summary") {
                Some(Value::String(s)) if !s.is_empty() => s.clone(),
                _ => value.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(kind: ContentKind, body: &'static str) -> String {
        SummaryPayload::decode(kind, Bytes::from_static(body.as_bytes()))
            .unwrap()
            .into_text()
    }

    #[test]
    fn content_kind_follows_header_not_body() {
        assert_eq!(
            ContentKind::from_content_type("application/json; charset=utf-8"),
            ContentKind::Json
        );
        assert_eq!(ContentKind::from_content_type("text/plain"), ContentKind::Text);
        assert_eq!(ContentKind::from_content_type(""), ContentKind::Text);
        // JSON-looking body under text/plain stays verbatim.
        assert_eq!(text_of(ContentKind::Text, r#"{"summary":"X"}"#), r#"{"summary":"X"}"#);
    }

    #[test]
    fn structured_summary_field_is_extracted() {
        assert_eq!(text_of(ContentKind::Json, r#"{"summary":"X"}"#), "X");
    }

    #[test]
    fn bare_json_string_is_used() {
        assert_eq!(text_of(ContentKind::Json, r#""Y""#), "Y");
    }

    #[test]
    fn plain_text_is_verbatim() {
        assert_eq!(text_of(ContentKind::Text, "Z\nline two"), "Z\nline two");
    }

    #[test]
    fn unknown_shapes_fall_back_to_json_encoding() {
        assert_eq!(text_of(ContentKind::Json, r#"{"result":1}"#), r#"{"result":1}"#);
        assert_eq!(text_of(ContentKind::Json, r#"{"summary":""}"#), r#"{"summary":""}"#);
        assert_eq!(text_of(ContentKind::Json, "[1,2]"), "[1,2]");
    }

    #[test]
    fn invalid_json_under_json_header_is_a_decode_error() {
        let err = SummaryPayload::decode(ContentKind::Json, Bytes::from_static(b"not json"))
            .unwrap_err();
        assert!(matches!(err, GatewayError::Decode { endpoint: "/summary", .. }));
    }
}
