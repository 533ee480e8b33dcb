use garde::Validate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pricing/labeling fields of one product. Forwarded to the microservice untouched.
pub type ProductRecord = serde_json::Value;

/// Body of the inbound POST, as sent by the client.
#[derive(Debug, Deserialize, Validate)]
pub struct ProcessImageRequest {
    #[serde(default)]
    #[garde(required, length(min = 1))]
    pub products: Option<Vec<ProductRecord>>,

    #[serde(default)]
    #[garde(required, length(min = 1))]
    pub original_image_url: Option<String>,

    #[serde(default)]
    #[garde(skip)]
    pub watermark_url: Option<String>,
}

/// A validated composition job. Also the body of the submission call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRequest {
    pub products: Vec<ProductRecord>,
    pub original_image_url: String,
    pub watermark_url: Option<String>,
}

impl ProcessImageRequest {
    /// Check the request shape and turn it into a [`JobRequest`].
    ///
    /// Structural rules (presence, non-empty) come from the `garde` derive;
    /// the product limit, product shape and URL schemes are checked after.
    pub fn into_job_request(self, max_products: usize) -> Result<JobRequest, ValidationError> {
        if let Err(report) = self.validate() {
            let failed: Vec<String> = report.iter().map(|(path, _)| path.to_string()).collect();
            if failed.iter().any(|p| p.starts_with("products")) {
                return Err(ValidationError::MissingProducts);
            }
            return Err(ValidationError::MissingImageUrl);
        }

        let (Some(products), Some(original_image_url)) = (self.products, self.original_image_url)
        else {
            return Err(ValidationError::MissingProducts);
        };

        if products.len() > max_products {
            return Err(ValidationError::TooManyProducts { max: max_products });
        }
        if let Some(index) = products.iter().position(|p| !p.is_object()) {
            return Err(ValidationError::ProductNotObject { index });
        }
        if !is_http_url(&original_image_url) {
            return Err(ValidationError::InvalidUrl {
                field: "original_image_url",
            });
        }

        // An empty watermark means "no watermark".
        let watermark_url = self.watermark_url.filter(|w| !w.is_empty());
        if let Some(ref watermark) = watermark_url {
            if !is_http_url(watermark) {
                return Err(ValidationError::InvalidUrl {
                    field: "watermark_url",
                });
            }
        }

        Ok(JobRequest {
            products,
            original_image_url,
            watermark_url,
        })
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Identifier the microservice assigns to a job. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input rejected before any call to the microservice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("JSON inválido: {0}")]
    InvalidBody(String),

    #[error("Campo 'products' obrigatório e não vazio")]
    MissingProducts,

    #[error("Máximo de {max} produtos por requisição")]
    TooManyProducts { max: usize },

    #[error("Produto no índice {index} deve ser um objeto")]
    ProductNotObject { index: usize },

    #[error("Campo 'original_image_url' obrigatório")]
    MissingImageUrl,

    #[error("'{field}' deve ser uma URL válida (http/https)")]
    InvalidUrl { field: &'static str },
}
