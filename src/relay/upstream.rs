//! Outbound HTTP capability.

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use thiserror::Error;

use crate::relay::target::TargetUrl;

/// Desktop browser identification sent to targets that filter naive bots.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0";

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Status and raw body of an upstream reply.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures while talking to the upstream.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The request could not be built (e.g. an unparseable target).
    #[error("invalid request: {0}")]
    Request(String),

    /// Connection, DNS, TLS or body-read failure.
    #[error("{0}")]
    Transport(String),
}

/// Something that can POST a form body and hand back the reply.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn post_form(
        &self,
        target: &TargetUrl,
        body: String,
    ) -> Result<UpstreamResponse, UpstreamError>;
}

/// reqwest-backed upstream using transport defaults for timeouts and redirects.
#[derive(Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpUpstream {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            user_agent: user_agent.into(),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl Default for HttpUpstream {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT)
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn post_form(
        &self,
        target: &TargetUrl,
        body: String,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let url = reqwest::Url::parse(target.as_str())
            .map_err(|e| UpstreamError::Request(format!("{}: {}", e, target)))?;

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(USER_AGENT, &self.user_agent)
            .body(body)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(describe(&e)))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport(describe(&e)))?;

        Ok(UpstreamResponse { status, body })
    }
}

/// reqwest's top-level message hides the root cause; append the source chain.
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        let ok = UpstreamResponse { status: 204, body: Bytes::new() };
        let not_found = UpstreamResponse { status: 404, body: Bytes::new() };
        assert!(ok.is_success());
        assert!(!not_found.is_success());
    }

    #[tokio::test]
    async fn relative_target_is_request_error() {
        let upstream = HttpUpstream::default();
        let target = crate::relay::target::extract_target(Some("url=not-a-url")).unwrap();
        let err = upstream.post_form(&target, String::new()).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Request(_)));
        assert!(err.to_string().contains("not-a-url"));
    }

    #[test]
    fn default_user_agent_is_browser_like() {
        let upstream = HttpUpstream::default();
        assert!(upstream.user_agent().starts_with("Mozilla/5.0"));
    }
}
