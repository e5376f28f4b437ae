pub mod middleware;
pub mod routes;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use self::middleware::auth::require_session;
use self::routes::{auth, dashboard, email_templates, notifications, participants, users};
pub use self::state::AppState;

pub fn router(state: AppState) -> Router {
    // Everything except login and health needs a resolved admin session.
    let protected_routes = Router::new()
        .route("/", get(dashboard::dashboard_handler))
        .route("/participants", get(participants::list_handler))
        .route("/participants/refresh", post(participants::refresh_handler))
        .route("/participants/confirm", post(participants::confirm_handler))
        .route("/participants/cancel", post(participants::cancel_handler))
        .route(
            "/participants/:participant_id/status",
            post(participants::request_status_handler),
        )
        .route(
            "/participants/:participant_id/delete",
            post(participants::request_delete_handler),
        )
        .route("/users", get(users::list_handler))
        .route("/users/refresh", post(users::refresh_handler))
        .route("/users/confirm", post(users::confirm_handler))
        .route("/users/cancel", post(users::cancel_handler))
        .route(
            "/users/:user_id/toggle-admin",
            post(users::request_toggle_handler),
        )
        .route("/users/:user_id/delete", post(users::request_delete_handler))
        .route("/email-templates", get(email_templates::list_handler))
        .route(
            "/email-templates/:template_id",
            post(email_templates::save_handler),
        )
        .route(
            "/email-templates/:template_id/preview",
            get(email_templates::preview_handler),
        )
        .route("/notifications", get(notifications::drain_handler))
        .route("/logout", post(auth::logout_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/health", get(|| async { "ok" }))
        .merge(protected_routes)
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
