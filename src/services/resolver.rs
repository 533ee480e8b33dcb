use base64::Engine;
use tracing::warn;

use super::image_service::{join_url, ArtifactRetrievalError, JobBackend};
use crate::config::GatewayConfig;
use crate::models::job::JobHandle;
use crate::models::outcome::OutcomeEnvelope;
use crate::models::status::{JobStatus, JobStatusSnapshot};

const UNKNOWN_JOB_ERROR: &str = "Erro desconhecido no processamento";

/// Where polling ended up for a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalState {
    Resolved(JobStatusSnapshot),
    /// Budget ran out after this many attempts.
    Exhausted { attempts: u32 },
}

/// Maps a terminal poll result onto the client-facing [`OutcomeEnvelope`].
#[derive(Debug, Clone)]
pub struct ResultResolver {
    base_url: String,
    inline_image_data: bool,
    max_inline_bytes: usize,
}

impl ResultResolver {
    pub fn new(base_url: &str, inline_image_data: bool, max_inline_bytes: usize) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            inline_image_data,
            max_inline_bytes,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            &config.microservice_url,
            config.inline_image_data,
            config.max_inline_image_bytes,
        )
    }

    pub async fn resolve(
        &self,
        backend: &dyn JobBackend,
        task_id: JobHandle,
        terminal: TerminalState,
    ) -> OutcomeEnvelope {
        let snapshot = match terminal {
            TerminalState::Exhausted { attempts } => {
                return OutcomeEnvelope::Timeout {
                    task_id,
                    error: format!("Timeout ao processar imagem ({attempts} tentativas)"),
                };
            }
            TerminalState::Resolved(snapshot) => snapshot,
        };

        match snapshot.status {
            JobStatus::Completed => match snapshot.final_image_url {
                Some(path) => {
                    let image_data = if self.inline_image_data {
                        self.inline_artifact(backend, &task_id, &path).await
                    } else {
                        None
                    };
                    OutcomeEnvelope::Completed {
                        image_url: join_url(&self.base_url, &path),
                        image_data,
                        task_id,
                    }
                }
                None => OutcomeEnvelope::Failed {
                    task_id: Some(task_id),
                    error: "Tarefa concluída sem final_image_url".to_string(),
                },
            },
            JobStatus::Failed => OutcomeEnvelope::Failed {
                task_id: Some(task_id),
                error: snapshot
                    .error_message
                    .unwrap_or_else(|| UNKNOWN_JOB_ERROR.to_string()),
            },
            // The poller only hands over terminal snapshots.
            status => OutcomeEnvelope::internal_error(
                Some(task_id),
                format!("estado não terminal recebido: {status}"),
            ),
        }
    }

    /// Best effort: any failure is logged and the caller keeps the URL only.
    async fn inline_artifact(
        &self,
        backend: &dyn JobBackend,
        task_id: &JobHandle,
        path: &str,
    ) -> Option<String> {
        match self.fetch_encoded(backend, path).await {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                metrics::counter!("gateway_inline_fallbacks_total").increment(1);
                warn!(task_id = %task_id, error = %e, "Could not inline image, returning URL only");
                None
            }
        }
    }

    async fn fetch_encoded(
        &self,
        backend: &dyn JobBackend,
        path: &str,
    ) -> Result<String, ArtifactRetrievalError> {
        let bytes = backend.fetch_artifact(path, self.max_inline_bytes).await?;
        if bytes.len() > self.max_inline_bytes {
            return Err(ArtifactRetrievalError::TooLarge {
                size: bytes.len(),
                max: self.max_inline_bytes,
            });
        }
        image::guess_format(&bytes).map_err(|_| ArtifactRetrievalError::NotAnImage)?;
        Ok(base64::engine::general_purpose::STANDARD.encode(&bytes))
    }
}
