//! Inbound body shapes and their normalization to a form-urlencoded string.

use serde_json::Value;
use url::form_urlencoded;

/// The inbound body, as a hosting platform would hand it to a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundBody {
    /// Pre-parsed key/value pairs, in the order they were presented.
    Structured(Vec<(String, String)>),
    /// Anything that was not parsed into a mapping, passed through verbatim.
    Raw(String),
}

impl InboundBody {
    /// Classify a request body by its content type.
    ///
    /// Form bodies and JSON objects become [`InboundBody::Structured`];
    /// everything else is kept as text.
    pub fn from_request(content_type: Option<&str>, bytes: &[u8]) -> Self {
        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase());

        match mime.as_deref() {
            Some("application/x-www-form-urlencoded") => Self::Structured(
                form_urlencoded::parse(bytes)
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect(),
            ),
            Some("application/json") => match serde_json::from_slice::<Value>(bytes) {
                Ok(Value::Object(map)) => Self::Structured(
                    map.into_iter()
                        .map(|(k, v)| (k, coerce_value(v)))
                        .collect(),
                ),
                _ => Self::Raw(String::from_utf8_lossy(bytes).into_owned()),
            },
            _ => Self::Raw(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// Produce the outbound form-urlencoded body.
    pub fn into_form(self) -> String {
        match self {
            Self::Structured(pairs) => form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs)
                .finish(),
            Self::Raw(raw) => raw,
        }
    }
}

/// String coercion for non-string JSON values.
fn coerce_value(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
