use axum::{
    extract::{Path, Query, State},
    response::Html,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::{EmailTemplate, PreviewData, TemplateKind};
use crate::web::routes::{not_found, ApiResult};
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    /// Render with this participant's data instead of the sample data.
    participant_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SaveBody {
    content: String,
}

fn parse_kind(raw: &str) -> Result<TemplateKind, (axum::http::StatusCode, Json<Value>)> {
    raw.parse::<TemplateKind>().map_err(not_found)
}

pub async fn list_handler(State(state): State<AppState>) -> Json<Value> {
    state.templates.initialize().await;
    let templates: Vec<EmailTemplate> = state.templates.templates().await;
    Json(json!({
        "saving": state.templates.is_saving(),
        "templates": templates,
    }))
}

pub async fn preview_handler(
    State(state): State<AppState>,
    Path(template_id): Path<String>,
    Query(q): Query<PreviewQuery>,
) -> Result<Html<String>, (axum::http::StatusCode, Json<Value>)> {
    let kind = parse_kind(&template_id)?;

    let data = match q.participant_id {
        Some(id) => {
            let participant = state
                .participants
                .store()
                .get(id)
                .await
                .ok_or_else(|| not_found(format!("no participant with id {id}")))?;
            PreviewData::for_participant(&participant)
        }
        None => PreviewData::sample(),
    };

    let email = state
        .templates
        .preview(kind, &data)
        .await
        .ok_or_else(|| not_found(format!("unknown email template: {kind}")))?;
    Ok(Html(email.body))
}

pub async fn save_handler(
    State(state): State<AppState>,
    Path(template_id): Path<String>,
    Json(body): Json<SaveBody>,
) -> ApiResult<Value> {
    let kind = parse_kind(&template_id)?;
    let saved = state.templates.save(kind, &body.content).await;
    Ok(Json(json!({ "saved": saved })))
}
