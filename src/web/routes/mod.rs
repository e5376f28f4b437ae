pub mod auth;
pub mod dashboard;
pub mod email_templates;
pub mod notifications;
pub mod participants;
pub mod users;

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

use crate::services::confirmation_gate::GateError;

pub type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;

pub(crate) fn gate_error(err: GateError) -> (StatusCode, Json<Value>) {
    let status = match err {
        GateError::Busy | GateError::NothingPending => StatusCode::CONFLICT,
        GateError::UnknownEntity { .. } => StatusCode::NOT_FOUND,
        GateError::NotAllowed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };
    tracing::warn!(%status, error = %err, "gate_rejected_request");
    (status, Json(json!({ "error": err.to_string() })))
}

pub(crate) fn bad_request(message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message.into() })),
    )
}

pub(crate) fn not_found(message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": message.into() })))
}
