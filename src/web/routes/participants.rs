use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::{Participant, ParticipantStatus};
use crate::services::confirmation_gate::Prompt;
use crate::services::participants_service::{distinct_events, ParticipantFilter};
use crate::web::routes::{bad_request, gate_error, ApiResult};
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct ParticipantsQuery {
    event: Option<String>,
    status: Option<String>, // pending|approved|rejected|all
    search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ParticipantsView {
    pub loading: bool,
    pub processing_id: Option<i64>,
    pub prompt: Option<Prompt>,
    pub events: Vec<String>,
    pub participants: Vec<Participant>,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    status: ParticipantStatus,
}

pub async fn list_handler(
    State(state): State<AppState>,
    Query(q): Query<ParticipantsQuery>,
) -> ApiResult<ParticipantsView> {
    let status = match q.status.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(raw.parse::<ParticipantStatus>().map_err(bad_request)?),
    };
    let filter = ParticipantFilter {
        event: q.event,
        status,
        search: q.search,
    };

    let gate = &state.participants;
    gate.store().initialize().await;
    let all = gate.store().snapshot().await;

    Ok(Json(ParticipantsView {
        loading: gate.store().is_loading(),
        processing_id: gate.processing_id(),
        prompt: gate.prompt(),
        events: distinct_events(&all),
        participants: filter.apply(&all).into_iter().cloned().collect(),
    }))
}

pub async fn refresh_handler(State(state): State<AppState>) -> Json<Value> {
    let applied = state.participants.store().load().await;
    Json(json!({ "applied": applied }))
}

pub async fn request_status_handler(
    State(state): State<AppState>,
    Path(participant_id): Path<i64>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Prompt> {
    state
        .participants
        .request_change(participant_id, body.status)
        .await
        .map(Json)
        .map_err(gate_error)
}

pub async fn request_delete_handler(
    State(state): State<AppState>,
    Path(participant_id): Path<i64>,
) -> ApiResult<Prompt> {
    state
        .participants
        .request_delete(participant_id)
        .await
        .map(Json)
        .map_err(gate_error)
}

pub async fn confirm_handler(State(state): State<AppState>) -> ApiResult<Value> {
    let applied = state.participants.confirm().await.map_err(gate_error)?;
    Ok(Json(json!({ "applied": applied })))
}

pub async fn cancel_handler(State(state): State<AppState>) -> ApiResult<Value> {
    let action = state.participants.cancel().map_err(gate_error)?;
    Ok(Json(json!({ "cancelled": action.id() })))
}
