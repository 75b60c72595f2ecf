//! HTTP server setup and the relay handler.
//!
//! # Responsibilities
//! - Create the Axum Router (relay path + `/health`)
//! - Wire up middleware (CORS headers, request ID, tracing)
//! - Read the inbound body and hand it to the relay
//! - Translate the relay outcome into a response
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::validation::HEALTH_PATH;
use crate::config::{RelayConfig, RelaySettings};
use crate::http::request::{RequestIdExt, UuidRequestId};
use crate::http::response::apply_cors;
use crate::observability::metrics;
use crate::relay::{extract_target, perform_relay, HttpUpstream, InboundBody, RelayError, Upstream};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<dyn Upstream>,
    pub settings: Arc<RelaySettings>,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a server that relays through a real HTTP client.
    pub fn new(config: RelayConfig) -> Self {
        let upstream = Arc::new(HttpUpstream::new(config.relay.user_agent.clone()));
        Self::with_upstream(config, upstream)
    }

    /// Create a server around a caller-supplied upstream.
    pub fn with_upstream(config: RelayConfig, upstream: Arc<dyn Upstream>) -> Self {
        let state = AppState {
            upstream,
            settings: Arc::new(config.relay.clone()),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let router = Router::new()
            .route(&config.relay.path, any(relay_handler))
            .route(HEALTH_PATH, get(health_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request.headers().request_id(),
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId));

        apply_cors(router)
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            relay_path = %self.config.relay.path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Relay handler. Any method is processed the same way.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let request_id = parts.headers.request_id().to_string();
    let query = parts.uri.query();
    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let limit = state.settings.max_body_bytes;
    let outcome: Result<serde_json::Value, RelayError> =
        match axum::body::to_bytes(body, limit).await {
            Ok(bytes) => {
                let inbound = InboundBody::from_request(content_type, &bytes);
                perform_relay(state.upstream.as_ref(), query, inbound).await
            }
            // A missing target is reported ahead of an unreadable body.
            Err(e) => extract_target(query).and_then(|_| Err(RelayError::Body(e.to_string()))),
        };

    match outcome {
        Ok(value) => {
            tracing::debug!(request_id = %request_id, "Relay succeeded");
            metrics::record_relay("ok", 200, start);
            (StatusCode::OK, Json(value)).into_response()
        }
        Err(e) => {
            let status = e.status();
            if matches!(e, RelayError::MissingTarget) {
                tracing::warn!(request_id = %request_id, "Missing target parameter");
            } else {
                tracing::error!(request_id = %request_id, kind = e.kind(), error = %e, "Relay failed");
            }
            metrics::record_relay(e.kind(), status.as_u16(), start);
            e.into_response()
        }
    }
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
