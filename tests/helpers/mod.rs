//! Fake image microservice and router helpers for integration tests

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use http_body_util::BodyExt;
use image_compose_gateway::{
    app_state::AppState, config::GatewayConfig, routes,
    services::image_service::ImageServiceClient,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::util::ServiceExt;

pub const JPEG: [u8; 8] = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];

/// Scripted stand-in for the image microservice.
pub struct FakeMicroservice {
    pub submit_response: Mutex<(u16, Value)>,
    pub statuses: Mutex<VecDeque<(u16, Value)>>,
    /// Served once `statuses` is drained.
    pub default_status: Mutex<(u16, Value)>,
    pub artifact: Mutex<Option<Vec<u8>>>,
    pub submitted: Mutex<Vec<Value>>,
    pub status_calls: AtomicU32,
}

impl FakeMicroservice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            submit_response: Mutex::new((200, json!({ "task_id": "abc123" }))),
            statuses: Mutex::new(VecDeque::new()),
            default_status: Mutex::new((200, json!({ "status": "PENDING" }))),
            artifact: Mutex::new(None),
            submitted: Mutex::new(Vec::new()),
            status_calls: AtomicU32::new(0),
        })
    }

    pub fn push_status(&self, body: Value) {
        self.statuses.lock().unwrap().push_back((200, body));
    }

    pub fn push_status_code(&self, code: u16) {
        self.statuses
            .lock()
            .unwrap()
            .push_back((code, json!({ "error": "boom" })));
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn submit_count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    /// Serve on an ephemeral local port and return the base URL.
    pub async fn spawn(self: &Arc<Self>) -> String {
        let app = Router::new()
            .route("/api/v1/process-image", post(submit))
            .route("/api/v1/status/{task_id}", get(status))
            .route("/out/{file}", get(artifact))
            .route("/chunked/{file}", get(chunked_artifact))
            .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
            .layer(DefaultBodyLimit::disable())
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }
}

fn reply(code: u16, body: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::from_u16(code).unwrap(), Json(body))
}

async fn submit(
    State(fake): State<Arc<FakeMicroservice>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    fake.submitted.lock().unwrap().push(body);
    let (code, body) = fake.submit_response.lock().unwrap().clone();
    reply(code, body)
}

async fn status(
    State(fake): State<Arc<FakeMicroservice>>,
    Path(_task_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    fake.status_calls.fetch_add(1, Ordering::SeqCst);
    let next = fake.statuses.lock().unwrap().pop_front();
    let (code, body) = next.unwrap_or_else(|| fake.default_status.lock().unwrap().clone());
    reply(code, body)
}

async fn artifact(
    State(fake): State<Arc<FakeMicroservice>>,
    Path(_file): Path<String>,
) -> Result<Vec<u8>, StatusCode> {
    fake.artifact.lock().unwrap().clone().ok_or(StatusCode::NOT_FOUND)
}

/// Same artifact sent in two chunks without a `Content-Length`.
async fn chunked_artifact(
    State(fake): State<Arc<FakeMicroservice>>,
    Path(_file): Path<String>,
) -> Result<Body, StatusCode> {
    let bytes = fake.artifact.lock().unwrap().clone().ok_or(StatusCode::NOT_FOUND)?;
    let (head, tail) = bytes.split_at(bytes.len() / 2);
    let chunks = vec![head.to_vec(), tail.to_vec()];
    Ok(Body::from_stream(futures::stream::iter(
        chunks.into_iter().map(Ok::<_, std::io::Error>),
    )))
}

/// Gateway config pointed at `base`, with a short poll interval.
pub fn test_config(base: &str) -> GatewayConfig {
    GatewayConfig {
        microservice_url: base.to_string(),
        poll_interval_ms: 5,
        request_timeout_secs: 5,
        ..GatewayConfig::default()
    }
}

pub fn gateway_app(config: &GatewayConfig) -> Router {
    let client = ImageServiceClient::new(&config.microservice_url, Duration::from_secs(5))
        .expect("client");
    let state = AppState::new(config, Arc::new(client));
    let prometheus = PrometheusBuilder::new().build_recorder().handle();
    routes::router(state, Arc::new(prometheus))
}

pub fn valid_body() -> Value {
    json!({
        "products": [{
            "Referencia": "REF-001",
            "DescricaoFinal": "Camiseta Premium",
            "Preco": 99.9,
            "PrecoPromocional": 79.9,
            "PrecoPromocionalAVista": 75.9,
            "TamanhosDisponiveis": "P, M, G",
            "NumeracaoUtilizada": "M",
            "Esgotado": false
        }],
        "original_image_url": "https://example.com/image.jpg",
        "watermark_url": "https://example.com/logo.png"
    })
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Send one request and return status plus raw body bytes.
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let body = res.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

pub async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, req).await;
    (status, serde_json::from_slice(&body).unwrap())
}
