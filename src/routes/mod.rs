pub mod health;
pub mod metrics;
pub mod process;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, MethodRouter};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

fn process_endpoint() -> MethodRouter<AppState> {
    post(process::process_image).fallback(process::method_not_allowed)
}

/// Build the full HTTP surface of the gateway.
///
/// OPTIONS preflights never reach a handler: `CorsLayer` acknowledges them.
/// `MAX_BODY_BYTES` replaces the 2 MB cap the `Json` extractor applies on its own.
pub fn router(state: AppState, prometheus: Arc<PrometheusHandle>) -> Router {
    let body_limit = state.max_body_bytes;

    Router::new()
        .route("/", process_endpoint())
        .route("/api/v1/process-image", process_endpoint())
        .route("/health", get(health::health_check))
        .with_state(state)
        .route(
            "/metrics",
            get(metrics::prometheus_metrics).with_state(prometheus),
        )
        .layer(CatchPanicLayer::custom(process::panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
}
