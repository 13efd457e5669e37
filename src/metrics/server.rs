//! HTTP endpoint serving the metrics registry

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::encode_metrics;

/// Router with `/metrics` and `/healthz`
pub fn metrics_router() -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(health_handler))
        .layer(TraceLayer::new_for_http())
}

/// Serve the metrics router until `shutdown` completes
pub async fn serve_metrics(
    listener: TcpListener,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "Metrics endpoint listening");
    }

    axum::serve(listener, metrics_router())
        .with_graceful_shutdown(shutdown)
        .await
}

async fn metrics_handler() -> Response {
    match encode_metrics() {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            let message = e.to_string();
            tracing::error!(error = %message, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
        }
    }
}

async fn health_handler() -> &'static str {
    "ok"
}
