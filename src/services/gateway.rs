use axum::http::StatusCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use super::image_service::{JobBackend, StatusQueryError, SubmissionError};
use super::poller::{PollError, Poller};
use super::resolver::{ResultResolver, TerminalState};
use crate::config::GatewayConfig;
use crate::models::job::{JobHandle, JobRequest};
use crate::models::outcome::OutcomeEnvelope;

/// Runs one job through submit → poll → resolve.
///
/// Every failure past validation is turned into an [`OutcomeEnvelope`] here;
/// nothing escapes as a transport fault.
pub struct Gateway {
    backend: Arc<dyn JobBackend>,
    poller: Poller,
    resolver: ResultResolver,
}

/// A failure that stopped orchestration before a job outcome was known.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    StatusQuery(#[from] StatusQueryError),
}

impl Gateway {
    pub fn new(backend: Arc<dyn JobBackend>, poller: Poller, resolver: ResultResolver) -> Self {
        Self {
            backend,
            poller,
            resolver,
        }
    }

    pub fn from_config(backend: Arc<dyn JobBackend>, config: &GatewayConfig) -> Self {
        Self::new(
            backend,
            Poller::from_config(config),
            ResultResolver::from_config(config),
        )
    }

    pub fn backend(&self) -> &dyn JobBackend {
        self.backend.as_ref()
    }

    /// Process a validated job and pick the transport status for the reply.
    ///
    /// Always `200 OK` except when the microservice rejects the submission,
    /// in which case its status is mirrored.
    pub async fn handle(&self, job: JobRequest) -> (StatusCode, OutcomeEnvelope) {
        let started = Instant::now();
        info!(products = job.products.len(), "Processing image job");

        let mut task_id = None;
        let result = self.run(&job, &mut task_id).await;
        metrics::histogram!("gateway_job_duration_seconds").record(started.elapsed().as_secs_f64());

        match result {
            Ok(envelope) => {
                record_outcome(&envelope);
                (StatusCode::OK, envelope)
            }
            Err(GatewayError::Submission(SubmissionError::Rejected { status, message })) => {
                metrics::counter!("gateway_orchestration_errors_total").increment(1);
                error!(status, error = %message, "Microservice rejected job submission");
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                let envelope = OutcomeEnvelope::Failed {
                    task_id: None,
                    error: message,
                };
                (status, envelope)
            }
            Err(e) => {
                metrics::counter!("gateway_orchestration_errors_total").increment(1);
                error!(task_id = ?task_id.as_ref().map(JobHandle::as_str), error = %e, "Image job orchestration failed");
                (StatusCode::OK, OutcomeEnvelope::internal_error(task_id, e))
            }
        }
    }

    /// Submission strictly precedes polling, which strictly precedes resolution.
    async fn run(
        &self,
        job: &JobRequest,
        task_id: &mut Option<JobHandle>,
    ) -> Result<OutcomeEnvelope, GatewayError> {
        let handle = self.backend.submit(job).await?;
        metrics::counter!("gateway_jobs_submitted_total").increment(1);
        info!(task_id = %handle, "Job submitted, polling for completion");
        *task_id = Some(handle.clone());

        let terminal = match self.poller.poll(self.backend.as_ref(), &handle).await {
            Ok(snapshot) => TerminalState::Resolved(snapshot),
            Err(PollError::Exhausted { attempts }) => TerminalState::Exhausted { attempts },
            Err(PollError::StatusQuery(e)) => return Err(e.into()),
        };

        Ok(self
            .resolver
            .resolve(self.backend.as_ref(), handle, terminal)
            .await)
    }
}

fn record_outcome(envelope: &OutcomeEnvelope) {
    let name = match envelope {
        OutcomeEnvelope::Completed { .. } => "gateway_jobs_completed_total",
        OutcomeEnvelope::Failed { .. } => "gateway_jobs_failed_total",
        OutcomeEnvelope::Timeout { .. } => "gateway_jobs_timeout_total",
    };
    metrics::counter!(name).increment(1);
}
