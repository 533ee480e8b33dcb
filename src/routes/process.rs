use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::app_state::AppState;
use crate::models::job::{ProcessImageRequest, ValidationError};
use crate::models::outcome::{ErrorResponse, OutcomeEnvelope};

/// POST /api/v1/process-image — compose an image and wait for the result.
///
/// Input errors are `400 {error}`. Everything after validation answers with
/// an outcome body whose `status` field tells completed from failed.
pub async fn process_image(
    State(state): State<AppState>,
    payload: Result<Json<ProcessImageRequest>, JsonRejection>,
) -> Response {
    let job = payload
        .map_err(|rejection| ValidationError::InvalidBody(rejection.body_text()))
        .and_then(|Json(request)| request.into_job_request(state.max_products_per_request));

    let job = match job {
        Ok(job) => job,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected invalid process-image request");
            return error_response(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    let (status, envelope) = state.gateway.handle(job).await;
    (status, Json(envelope.to_response())).into_response()
}

pub async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Método não permitido".to_string())
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

/// Turns a handler panic into the same failed-outcome body as any other fault.
pub fn panic_response(panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "falha inesperada".to_string()
    };
    tracing::error!(panic = %detail, "Handler panicked");
    metrics::counter!("gateway_orchestration_errors_total").increment(1);

    let envelope = OutcomeEnvelope::internal_error(None, detail);
    (StatusCode::OK, Json(envelope.to_response())).into_response()
}
