use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use tracing::info;

use crate::web::middleware::auth::AuthenticatedAdmin;
use crate::web::AppState;

/// Sign-in happens against the backend; this page only re-checks the
/// session so a fresh cookie is picked up without a restart.
pub async fn login_page(State(state): State<AppState>) -> Response {
    match state.session.check_session().await {
        Some(identity) => {
            info!(user_id = %identity.id, "➡️  session found, redirecting to dashboard");
            Redirect::to("/").into_response()
        }
        None => (
            axum::http::StatusCode::UNAUTHORIZED,
            "Not signed in - sign in on the registrations backend and reload this page",
        )
            .into_response(),
    }
}

pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedAdmin(admin)): Extension<AuthenticatedAdmin>,
) -> Response {
    info!(user_id = %admin.id, email = %admin.email, "👋 admin logging out");
    state.session.end_session().await;
    state.teardown().await;
    Redirect::to("/login").into_response()
}
