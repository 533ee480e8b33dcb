use image_compose_gateway::{
    app_state::AppState, config::GatewayConfig, routes,
    services::image_service::ImageServiceClient,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = GatewayConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!(
        microservice_url = %config.microservice_url,
        max_poll_attempts = config.max_poll_attempts,
        poll_interval_ms = config.poll_interval_ms,
        inline_image_data = config.inline_image_data,
        "Initializing image-compose-gateway"
    );

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!("gateway_jobs_submitted_total", "Jobs accepted by the image microservice");
    metrics::describe_counter!("gateway_jobs_completed_total", "Jobs that finished with an image");
    metrics::describe_counter!("gateway_jobs_failed_total", "Jobs the microservice reported as failed");
    metrics::describe_counter!("gateway_jobs_timeout_total", "Jobs that exhausted the poll budget");
    metrics::describe_counter!(
        "gateway_orchestration_errors_total",
        "Requests that failed while submitting or polling"
    );
    metrics::describe_counter!(
        "gateway_inline_fallbacks_total",
        "Inline image requests that fell back to URL only"
    );
    metrics::describe_histogram!("gateway_poll_attempts", "Status queries per job");
    metrics::describe_histogram!(
        "gateway_job_duration_seconds",
        "Time from submission to outcome"
    );

    tracing::info!("Initializing image microservice client");
    let client = ImageServiceClient::new(&config.microservice_url, config.request_timeout())
        .expect("Failed to initialize image microservice client");

    let state = AppState::new(&config, Arc::new(client));
    let app = routes::router(state, prometheus_handle);

    tracing::info!("Starting image-compose-gateway on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
