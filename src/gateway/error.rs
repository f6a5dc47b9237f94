//! Failure taxonomy for Gateway calls and the per-endpoint rules for turning a
//! non-2xx body into operator-readable text.

use super::summary::ContentKind;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    /// Non-2xx response; `message` is already the extracted detail text.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl GatewayError {
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Status { status, .. } => Some(*status),
            GatewayError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// How a failed endpoint's body is mined for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DetailRule {
    /// `{detail}` from a JSON body (run).
    Detail,
    /// `{detail}` then `{message}` from JSON, else raw text (summary).
    DetailOrMessage,
    /// Raw body text (stop).
    RawText,
}

pub(crate) fn generic_failure(status: u16) -> String {
    format!("request failed with status {status}")
}

/// Extract the human-readable failure message for a non-2xx response.
pub(crate) fn extract_detail(rule: DetailRule, kind: ContentKind, body: &[u8], status: u16) -> String {
    let text = String::from_utf8_lossy(body);
    let extracted = match rule {
        DetailRule::Detail => serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(render_field)),
        DetailRule::DetailOrMessage => match kind {
            ContentKind::Json => serde_json::from_slice::<Value>(body).ok().map(|v| {
                v.get("detail")
                    .and_then(render_field)
                    .or_else(|| v.get("message").and_then(render_field))
                    .unwrap_or_else(|| v.to_string())
            }),
            ContentKind::Text => Some(text.trim().to_string()),
        },
        DetailRule::RawText => Some(text.trim().to_string()),
    };
    extracted
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| generic_failure(status))
}

/// Strings are used as-is; FastAPI validation lists and other values as compact JSON.
fn render_field(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
