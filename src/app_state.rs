use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::services::{gateway::Gateway, image_service::JobBackend};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub max_products_per_request: usize,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(config: &GatewayConfig, backend: Arc<dyn JobBackend>) -> Self {
        Self {
            gateway: Arc::new(Gateway::from_config(backend, config)),
            max_products_per_request: config.max_products_per_request,
            max_body_bytes: config.max_body_bytes,
        }
    }
}
