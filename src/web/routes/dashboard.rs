use axum::{extract::State, Json};

use crate::services::dashboard_service::DashboardSummary;
use crate::web::AppState;

pub async fn dashboard_handler(State(state): State<AppState>) -> Json<DashboardSummary> {
    let store = state.participants.store();
    store.initialize().await;
    Json(DashboardSummary::from_participants(&store.snapshot().await))
}
