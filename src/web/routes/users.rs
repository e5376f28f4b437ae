use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::models::User;
use crate::services::confirmation_gate::Prompt;
use crate::services::resources::ToggleAdmin;
use crate::web::routes::{gate_error, ApiResult};
use crate::web::AppState;

#[derive(Debug, Serialize)]
pub struct UsersView {
    pub loading: bool,
    pub processing_id: Option<i64>,
    pub prompt: Option<Prompt>,
    pub users: Vec<User>,
}

pub async fn list_handler(State(state): State<AppState>) -> Json<UsersView> {
    let gate = &state.users;
    gate.store().initialize().await;

    Json(UsersView {
        loading: gate.store().is_loading(),
        processing_id: gate.processing_id(),
        prompt: gate.prompt(),
        users: gate.store().snapshot().await,
    })
}

pub async fn refresh_handler(State(state): State<AppState>) -> Json<Value> {
    let applied = state.users.store().load().await;
    Json(json!({ "applied": applied }))
}

pub async fn request_toggle_handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Prompt> {
    state
        .users
        .request_change(user_id, ToggleAdmin)
        .await
        .map(Json)
        .map_err(gate_error)
}

pub async fn request_delete_handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Prompt> {
    state
        .users
        .request_delete(user_id)
        .await
        .map(Json)
        .map_err(gate_error)
}

pub async fn confirm_handler(State(state): State<AppState>) -> ApiResult<Value> {
    let applied = state.users.confirm().await.map_err(gate_error)?;
    Ok(Json(json!({ "applied": applied })))
}

pub async fn cancel_handler(State(state): State<AppState>) -> ApiResult<Value> {
    let action = state.users.cancel().map_err(gate_error)?;
    Ok(Json(json!({ "cancelled": action.id() })))
}
