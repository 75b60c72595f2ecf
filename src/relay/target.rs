//! Target URL extraction from the inbound query string.
//!
//! The target arrives percent-encoded in the `url` query parameter. Decoding
//! is strict: a `%` not followed by two hex digits is rejected instead of
//! being passed through, so a mangled target never reaches the wire.

use std::fmt;

use crate::relay::RelayError;

/// Name of the query parameter carrying the target URL.
pub const TARGET_PARAM: &str = "url";

/// A decoded upstream target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUrl(String);

impl TargetUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host portion for logging, if the target parses as a URL.
    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.0)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Find and decode the target URL in a raw query string.
///
/// Only the first `url` pair counts. A missing or empty value is
/// [`RelayError::MissingTarget`]; a malformed escape is [`RelayError::Decode`].
pub fn extract_target(query: Option<&str>) -> Result<TargetUrl, RelayError> {
    let raw = query
        .and_then(|q| {
            q.split('&').find_map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (key == TARGET_PARAM).then_some(value)
            })
        })
        .filter(|value| !value.is_empty())
        .ok_or(RelayError::MissingTarget)?;

    decode_component(raw).map(TargetUrl)
}

/// Percent-decode a single URI component.
pub fn decode_component(raw: &str) -> Result<String, RelayError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            match escape {
                Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => i += 3,
                _ => {
                    return Err(RelayError::Decode(format!(
                        "malformed escape sequence at offset {}",
                        i
                    )))
                }
            }
        } else {
            i += 1;
        }
    }

    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| RelayError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_encoded_target() {
        let target = extract_target(Some("url=https%3A%2F%2Fexample.com%2Fendpoint")).unwrap();
        assert_eq!(target.as_str(), "https://example.com/endpoint");
        assert_eq!(target.host().as_deref(), Some("example.com"));
    }

    #[test]
    fn finds_param_among_others() {
        let target = extract_target(Some("a=1&url=http%3A%2F%2Flocalhost%3A3000%2Fx&b=2")).unwrap();
        assert_eq!(target.as_str(), "http://localhost:3000/x");
    }

    #[test]
    fn first_occurrence_wins() {
        let target = extract_target(Some("url=http%3A%2F%2Fone&url=http%3A%2F%2Ftwo")).unwrap();
        assert_eq!(target.as_str(), "http://one");
    }

    #[test]
    fn missing_or_empty_is_missing_target() {
        assert!(matches!(extract_target(None), Err(RelayError::MissingTarget)));
        assert!(matches!(extract_target(Some("")), Err(RelayError::MissingTarget)));
        assert!(matches!(extract_target(Some("url=")), Err(RelayError::MissingTarget)));
        assert!(matches!(extract_target(Some("url")), Err(RelayError::MissingTarget)));
        assert!(matches!(extract_target(Some("target=x")), Err(RelayError::MissingTarget)));
    }

    #[test]
    fn unencoded_target_passes_through() {
        let target = extract_target(Some("url=https://example.com/a")).unwrap();
        assert_eq!(target.as_str(), "https://example.com/a");
    }

    #[test]
    fn plus_is_kept_literally() {
        assert_eq!(decode_component("a+b").unwrap(), "a+b");
    }

    #[test]
    fn malformed_escape_is_decode_error() {
        assert!(matches!(decode_component("%E0%A4%A"), Err(RelayError::Decode(_))));
        assert!(matches!(decode_component("100%"), Err(RelayError::Decode(_))));
        assert!(matches!(decode_component("%zz"), Err(RelayError::Decode(_))));
    }

    #[test]
    fn invalid_utf8_is_decode_error() {
        assert!(matches!(decode_component("%FF%FE"), Err(RelayError::Decode(_))));
    }
}
