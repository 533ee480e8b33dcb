use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Base address of the image-composition microservice
    #[serde(default = "default_microservice_url")]
    pub microservice_url: String,

    /// Status queries performed before giving up on a job
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Suspension between two status queries, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Embed the finished image as base64 in the response
    #[serde(default)]
    pub inline_image_data: bool,

    /// Largest artifact that may be inlined
    #[serde(default = "default_max_inline_image_bytes")]
    pub max_inline_image_bytes: usize,

    /// Timeout applied to every outbound HTTP call, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_products_per_request")]
    pub max_products_per_request: usize,

    /// Inbound request body limit
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_microservice_url() -> String {
    "http://localhost:5001".to_string()
}

fn default_max_poll_attempts() -> u32 {
    60
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_max_inline_image_bytes() -> usize {
    6 * 1024 * 1024
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_products_per_request() -> usize {
    10
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            microservice_url: default_microservice_url(),
            max_poll_attempts: default_max_poll_attempts(),
            poll_interval_ms: default_poll_interval_ms(),
            inline_image_data: false,
            max_inline_image_bytes: default_max_inline_image_bytes(),
            request_timeout_secs: default_request_timeout_secs(),
            max_products_per_request: default_max_products_per_request(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_poll_attempts == 0 {
            return Err(ConfigError::Invalid(
                "MAX_POLL_ATTEMPTS must be at least 1".to_string(),
            ));
        }
        if self.microservice_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "MICROSERVICE_URL must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
