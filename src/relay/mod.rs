//! Relay subsystem.
//!
//! # Data Flow
//! ```text
//! query string ─▶ target.rs (extract + percent-decode `url`)
//! body bytes   ─▶ body.rs   (Structured | Raw → form-urlencoded string)
//!              ─▶ upstream.rs (one POST, fixed headers)
//!              ─▶ parse JSON ─▶ Ok(Value) | Err(RelayError)
//! ```
//!
//! The upstream's own status code is logged but not propagated: any reply
//! whose body parses as JSON is a success.

pub mod body;
pub mod target;
pub mod upstream;

use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub use body::InboundBody;
pub use target::{extract_target, TargetUrl};
pub use upstream::{HttpUpstream, Upstream, UpstreamError, UpstreamResponse};

/// Prefix for every failure reported to the caller with a 500.
pub const PROXY_ERROR_PREFIX: &str = "Proxy error: ";

/// Message returned with a 400 when the target parameter is absent.
pub const MISSING_TARGET_MESSAGE: &str = "missing URL parameter";

/// Everything that can stop a relay from producing a JSON value.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("missing URL parameter")]
    MissingTarget,

    #[error("URI malformed: {0}")]
    Decode(String),

    #[error("failed to read request body: {0}")]
    Body(String),

    #[error("{0}")]
    Upstream(#[from] UpstreamError),

    #[error("invalid JSON in upstream response: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl RelayError {
    /// Status reported to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingTarget => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text placed in the `error` field of the response body.
    pub fn client_message(&self) -> String {
        match self {
            RelayError::MissingTarget => MISSING_TARGET_MESSAGE.to_string(),
            other => format!("{}{}", PROXY_ERROR_PREFIX, other),
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::MissingTarget => "missing_target",
            RelayError::Decode(_) => "decode",
            RelayError::Body(_) => "body",
            RelayError::Upstream(_) => "upstream",
            RelayError::InvalidJson(_) => "invalid_json",
        }
    }
}

/// Forward `body` to the target named in `query` and parse the reply.
///
/// The target is validated before the body is touched, so a missing `url`
/// never results in an outbound call.
pub async fn perform_relay<U>(
    upstream: &U,
    query: Option<&str>,
    body: InboundBody,
) -> Result<Value, RelayError>
where
    U: Upstream + ?Sized,
{
    let target = extract_target(query)?;
    let form = body.into_form();
    let host = target.host().unwrap_or_else(|| "-".to_string());

    tracing::debug!(
        target_host = %host,
        body_len = form.len(),
        "Relaying form"
    );

    let response = upstream.post_form(&target, form).await?;
    crate::observability::metrics::record_upstream_status(response.status);

    if !response.is_success() {
        tracing::warn!(
            target_host = %host,
            upstream_status = response.status,
            "Upstream returned non-success status"
        );
    }

    Ok(serde_json::from_slice(&response.body)?)
}
