use serde::Deserialize;

/// Job state as reported by the microservice's status endpoint.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, strum::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    /// Anything else the microservice reports (e.g. NOT_FOUND). Not terminal.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One read of `GET /api/v1/status/{task_id}`. Created per poll, never cached.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct JobStatusSnapshot {
    pub status: JobStatus,
    #[serde(default)]
    pub final_image_url: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl JobStatusSnapshot {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
