//! Form relay library.
//!
//! Accepts a request carrying a percent-encoded `url` query parameter and a
//! form payload, POSTs the payload to that URL and hands the JSON reply back
//! with permissive CORS headers.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
