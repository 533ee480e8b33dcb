//! Scripted [`JobBackend`] for unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use super::image_service::{
    ArtifactRetrievalError, JobBackend, StatusQueryError, SubmissionError,
};
use crate::models::job::{JobHandle, JobRequest};
use crate::models::status::{JobStatus, JobStatusSnapshot};

pub enum SubmitScript {
    Accept(&'static str),
    Reject(u16, &'static str),
    NoHandle,
}

pub enum StatusScript {
    Snapshot(JobStatusSnapshot),
    HttpStatus(u16),
}

pub struct ScriptedBackend {
    submit: SubmitScript,
    statuses: Mutex<VecDeque<StatusScript>>,
    artifact: Option<Vec<u8>>,
    pub submit_calls: AtomicU32,
    pub status_calls: AtomicU32,
    pub artifact_calls: AtomicU32,
}

pub fn pending() -> StatusScript {
    StatusScript::Snapshot(snapshot(JobStatus::Pending, None, None))
}

pub fn completed(path: &str) -> StatusScript {
    StatusScript::Snapshot(snapshot(JobStatus::Completed, Some(path), None))
}

pub fn failed(message: &str) -> StatusScript {
    StatusScript::Snapshot(snapshot(JobStatus::Failed, None, Some(message)))
}

pub fn snapshot(
    status: JobStatus,
    final_image_url: Option<&str>,
    error_message: Option<&str>,
) -> JobStatusSnapshot {
    JobStatusSnapshot {
        status,
        final_image_url: final_image_url.map(str::to_string),
        error_message: error_message.map(str::to_string),
    }
}

pub fn job_request() -> JobRequest {
    JobRequest {
        products: vec![serde_json::json!({ "Referencia": "REF-001", "Preco": 99.9 })],
        original_image_url: "https://example.com/image.jpg".to_string(),
        watermark_url: None,
    }
}

pub fn handle(id: &str) -> JobHandle {
    JobHandle::new(id).unwrap()
}

impl ScriptedBackend {
    /// Accepts jobs as `abc123`; once the script runs out every poll reports PENDING.
    pub fn new(statuses: Vec<StatusScript>) -> Self {
        Self {
            submit: SubmitScript::Accept("abc123"),
            statuses: Mutex::new(statuses.into()),
            artifact: None,
            submit_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
            artifact_calls: AtomicU32::new(0),
        }
    }

    pub fn with_submit(mut self, submit: SubmitScript) -> Self {
        self.submit = submit;
        self
    }

    pub fn with_artifact(mut self, bytes: Vec<u8>) -> Self {
        self.artifact = Some(bytes);
        self
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobBackend for ScriptedBackend {
    async fn submit(&self, _job: &JobRequest) -> Result<JobHandle, SubmissionError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        match self.submit {
            SubmitScript::Accept(id) => Ok(handle(id)),
            SubmitScript::Reject(status, message) => Err(SubmissionError::Rejected {
                status,
                message: message.to_string(),
            }),
            SubmitScript::NoHandle => Err(SubmissionError::MissingHandle),
        }
    }

    async fn status(&self, _handle: &JobHandle) -> Result<JobStatusSnapshot, StatusQueryError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.statuses.lock().unwrap().pop_front().unwrap_or_else(pending);
        match next {
            StatusScript::Snapshot(snapshot) => Ok(snapshot),
            StatusScript::HttpStatus(status) => Err(StatusQueryError::Status { status }),
        }
    }

    async fn fetch_artifact(
        &self,
        _path: &str,
        max_bytes: usize,
    ) -> Result<Vec<u8>, ArtifactRetrievalError> {
        self.artifact_calls.fetch_add(1, Ordering::SeqCst);
        match &self.artifact {
            Some(bytes) if bytes.len() > max_bytes => Err(ArtifactRetrievalError::TooLarge {
                size: bytes.len(),
                max: max_bytes,
            }),
            Some(bytes) => Ok(bytes.clone()),
            None => Err(ArtifactRetrievalError::Status { status: 404 }),
        }
    }

    async fn health_check(&self) -> Result<(), StatusQueryError> {
        Ok(())
    }
}
