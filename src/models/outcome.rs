use serde::Serialize;

use super::job::JobHandle;

/// The single result handed back to the client for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeEnvelope {
    Completed {
        task_id: JobHandle,
        image_url: String,
        /// Base64 artifact, only when inline mode succeeded.
        image_data: Option<String>,
    },
    /// Job-level failure, or an orchestration failure (no task id if submission never succeeded).
    Failed {
        task_id: Option<JobHandle>,
        error: String,
    },
    Timeout {
        task_id: JobHandle,
        error: String,
    },
}

impl OutcomeEnvelope {
    /// Orchestration failure reported as an internal error.
    pub fn internal_error(task_id: Option<JobHandle>, detail: impl std::fmt::Display) -> Self {
        OutcomeEnvelope::Failed {
            task_id,
            error: format!("Erro interno: {detail}"),
        }
    }

    pub fn to_response(&self) -> ProcessImageResponse {
        match self {
            OutcomeEnvelope::Completed {
                task_id,
                image_url,
                image_data,
            } => ProcessImageResponse {
                status: OutcomeStatus::Completed,
                image_url: Some(image_url.clone()),
                image_data: image_data.clone(),
                error: None,
                task_id: Some(task_id.to_string()),
            },
            OutcomeEnvelope::Failed { task_id, error } => ProcessImageResponse {
                status: OutcomeStatus::Failed,
                image_url: None,
                image_data: None,
                error: Some(error.clone()),
                task_id: task_id.as_ref().map(ToString::to_string),
            },
            // Clients only distinguish completed from failed; the message says it timed out.
            OutcomeEnvelope::Timeout { task_id, error } => ProcessImageResponse {
                status: OutcomeStatus::Failed,
                image_url: None,
                image_data: None,
                error: Some(error.clone()),
                task_id: Some(task_id.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Completed,
    Failed,
}

/// JSON body of the inbound endpoint's 200 responses.
#[derive(Debug, Serialize)]
pub struct ProcessImageResponse {
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

/// Body for responses that carry only an error (400, 405).
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
