pub mod admin;
pub mod autopost;
pub mod chat;
pub mod forms;
pub mod health;
pub mod origin;

use axum::{http::StatusCode, Json};
use friday_agent::pipeline::PipelineError;
use serde_json::{json, Value};
use tracing::{info, warn};

/// Error half of every handler's `Result`.
pub type HttpError = (StatusCode, Json<Value>);

pub fn error(status: StatusCode, message: impl Into<String>) -> HttpError {
    (status, Json(json!({ "error": message.into() })))
}

/// Map a pipeline failure onto `{error, response}` with its status code.
///
/// Upstream causes are logged here and never echoed to the client.
pub fn pipeline_error(e: PipelineError) -> HttpError {
    let status = StatusCode::from_u16(e.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        warn!(error = %e, "chat pipeline failed");
    } else {
        info!(error = %e, status = status.as_u16(), "chat message refused");
    }

    let mut body = json!({ "error": e.error_message() });
    if let Some(response) = e.user_response() {
        body["response"] = json!(response);
    }
    if let PipelineError::RateLimited { retry_after_secs } = e {
        body["retryAfter"] = json!(retry_after_secs);
    }
    (status, Json(body))
}
