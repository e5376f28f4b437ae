use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::models::Identity;
use crate::services::session_guard::Access;
use crate::web::AppState;

#[derive(Clone, Debug)]
pub struct AuthenticatedAdmin(pub Identity);

pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.session.guard().await {
        Access::Granted(identity) => {
            // Inject the admin into request extensions
            request
                .extensions_mut()
                .insert(AuthenticatedAdmin(identity));
            next.run(request).await
        }
        // The guard resolved the first check above, so Pending is not
        // expected here; never render protected content for it either way.
        Access::Pending | Access::RedirectToLogin => Redirect::to("/login").into_response(),
    }
}
