use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

use crate::models::job::{JobHandle, JobRequest};
use crate::models::status::JobStatusSnapshot;

/// Outbound contract of the image-composition microservice.
///
/// The gateway only talks to the microservice through this trait so the
/// orchestration can run against a scripted backend in tests.
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Create a job. Exactly one attempt; never retried.
    async fn submit(&self, job: &JobRequest) -> Result<JobHandle, SubmissionError>;

    /// Read the current state of a job.
    async fn status(&self, handle: &JobHandle) -> Result<JobStatusSnapshot, StatusQueryError>;

    /// Download the artifact at a path relative to the microservice base.
    async fn fetch_artifact(
        &self,
        path: &str,
        max_bytes: usize,
    ) -> Result<Vec<u8>, ArtifactRetrievalError>;

    /// Check the microservice is reachable.
    async fn health_check(&self) -> Result<(), StatusQueryError>;
}

/// reqwest client for the microservice's `/api/v1` endpoints.
pub struct ImageServiceClient {
    http: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    task_id: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl ImageServiceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

#[async_trait]
impl JobBackend for ImageServiceClient {
    async fn submit(&self, job: &JobRequest) -> Result<JobHandle, SubmissionError> {
        let response = self
            .http
            .post(self.url("/api/v1/process-image"))
            .json(job)
            .send()
            .await
            .map_err(SubmissionError::Http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                message: error_message(response).await,
            });
        }

        let body: SubmitResponse = response.json().await.map_err(SubmissionError::Http)?;
        body.task_id
            .and_then(JobHandle::new)
            .ok_or(SubmissionError::MissingHandle)
    }

    async fn status(&self, handle: &JobHandle) -> Result<JobStatusSnapshot, StatusQueryError> {
        let response = self
            .http
            .get(self.url(&format!("/api/v1/status/{handle}")))
            .send()
            .await
            .map_err(StatusQueryError::Http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(StatusQueryError::Status {
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(StatusQueryError::Http)
    }

    async fn fetch_artifact(
        &self,
        path: &str,
        max_bytes: usize,
    ) -> Result<Vec<u8>, ArtifactRetrievalError> {
        let mut response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(ArtifactRetrievalError::Http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArtifactRetrievalError::Status {
                status: status.as_u16(),
            });
        }

        // Skip the download when the size is announced up front.
        if let Some(size) = response.content_length() {
            if size > max_bytes as u64 {
                return Err(ArtifactRetrievalError::TooLarge {
                    size: size as usize,
                    max: max_bytes,
                });
            }
        }

        // Chunked bodies carry no length; stop reading once past the cap.
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(ArtifactRetrievalError::Http)? {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(ArtifactRetrievalError::TooLarge {
                    size: bytes.len() + chunk.len(),
                    max: max_bytes,
                });
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }

    async fn health_check(&self) -> Result<(), StatusQueryError> {
        let response = self
            .http
            .get(self.url("/health"))
            .send()
            .await
            .map_err(StatusQueryError::Http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(StatusQueryError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// Pull the `error` field out of a rejection body, falling back to the raw text.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(ErrorBody { error: Some(error) }) => error,
        _ if !text.trim().is_empty() => text,
        _ => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    }
}

/// Resolve a microservice path against its base address.
///
/// Absolute URLs are returned unchanged; otherwise exactly one `/` separates
/// base and path.
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Job submission request failed: {0}")]
    Http(reqwest::Error),

    #[error("Microservice response did not include a task_id")]
    MissingHandle,
}

#[derive(Debug, thiserror::Error)]
pub enum StatusQueryError {
    #[error("Status check failed: {status}")]
    Status { status: u16 },

    #[error("Status request failed: {0}")]
    Http(reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactRetrievalError {
    #[error("Failed to download image: {status}")]
    Status { status: u16 },

    #[error("Image download failed: {0}")]
    Http(reqwest::Error),

    #[error("Image is {size} bytes, inline limit is {max}")]
    TooLarge { size: usize, max: usize },

    #[error("Downloaded artifact is not a recognizable image")]
    NotAnImage,
}
