use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use super::image_service::{JobBackend, StatusQueryError};
use crate::config::GatewayConfig;
use crate::models::job::JobHandle;
use crate::models::status::JobStatusSnapshot;

/// Polls a job's status until it reaches COMPLETED or FAILED.
///
/// The budget is a fixed number of status queries spaced by a fixed interval:
/// a job that never finishes costs exactly `max_attempts` queries and
/// `(max_attempts - 1) * interval` of waiting. There is no separate
/// wall-clock deadline. The wait is a tokio timer, so polling never ties up
/// a worker thread, and dropping the future abandons the loop.
#[derive(Debug, Clone)]
pub struct Poller {
    max_attempts: u32,
    interval: Duration,
}

impl Poller {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.max_poll_attempts, config.poll_interval())
    }

    /// Query until a terminal snapshot arrives or the budget runs out.
    ///
    /// A failing status query ends polling immediately; it is not treated as
    /// "still pending".
    pub async fn poll(
        &self,
        backend: &dyn JobBackend,
        handle: &JobHandle,
    ) -> Result<JobStatusSnapshot, PollError> {
        for attempt in 1..=self.max_attempts {
            let snapshot = backend.status(handle).await?;
            debug!(
                task_id = %handle,
                attempt,
                status = %snapshot.status,
                "Polled job status"
            );

            if snapshot.is_terminal() {
                metrics::histogram!("gateway_poll_attempts").record(attempt as f64);
                info!(task_id = %handle, attempt, status = %snapshot.status, "Job reached terminal state");
                return Ok(snapshot);
            }

            if attempt < self.max_attempts {
                sleep(self.interval).await;
            }
        }

        metrics::histogram!("gateway_poll_attempts").record(self.max_attempts as f64);
        Err(PollError::Exhausted {
            attempts: self.max_attempts,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The budget ran out without a terminal state.
    #[error("Timeout ao processar imagem ({attempts} tentativas)")]
    Exhausted { attempts: u32 },

    #[error(transparent)]
    StatusQuery(#[from] StatusQueryError),
}
