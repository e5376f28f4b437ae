use axum::{extract::State, Json};

use crate::services::notifications::Notification;
use crate::web::AppState;

pub async fn drain_handler(State(state): State<AppState>) -> Json<Vec<Notification>> {
    Json(state.notifier.drain())
}
