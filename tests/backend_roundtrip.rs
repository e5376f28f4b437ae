use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};

use registration_admin::config::Config;
use registration_admin::error::ApiError;
use registration_admin::models::{EmailTemplate, ParticipantStatus, TemplateKind};
use registration_admin::services::api_client::ApiClient;
use registration_admin::services::collection_store::CollectionStore;
use registration_admin::services::confirmation_gate::{ConfirmationGate, GateError};
use registration_admin::services::email_template_service::TemplateStore;
use registration_admin::services::notifications::{Level, Notifier};
use registration_admin::services::resources::{ParticipantsResource, ToggleAdmin, UsersResource};
use registration_admin::services::session_guard::{Access, SessionGuard};
use registration_admin::web::{router, AppState};

const TOKEN: &str = "secret-session";

#[derive(Clone)]
struct Backend {
    participants: Arc<Mutex<Vec<Value>>>,
    users: Arc<Mutex<Vec<Value>>>,
    templates: Arc<Mutex<Vec<Value>>>,
}

impl Backend {
    fn new() -> Self {
        Self {
            participants: Arc::new(Mutex::new(vec![
                json!({
                    "id": 1, "name": "Ada Lovelace", "email": "ada@example.com",
                    "phone": "0611111111", "event": "Hackathon", "status": "pending",
                    "amount_paid": 20, "transaction_id": "tx-1",
                    "created_at": "2024-03-01T10:00:00Z"
                }),
                json!({
                    "id": 2, "name": ["Grace", "Alan"], "email": "team@example.com",
                    "phone": ["0622222222", "0633333333"], "event": "Workshop",
                    "status": "approved", "amount_paid": 40,
                    "created_at": "2024-03-02T10:00:00Z"
                }),
            ])),
            users: Arc::new(Mutex::new(vec![
                json!({ "id": 1, "name": "Root", "email": "root@example.com", "admin": true, "created_at": "2024-01-01" }),
                json!({ "id": 5, "name": "Eve", "email": "eve@example.com", "admin": false, "created_at": "2024-01-02" }),
            ])),
            templates: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|cookies| {
            cookies
                .split("; ")
                .any(|c| c == format!("access_token={TOKEN}"))
        })
        .unwrap_or(false)
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Not authenticated" })),
    )
}

fn id_param(q: &HashMap<String, String>) -> i64 {
    q.get("id").and_then(|v| v.parse().ok()).unwrap_or(-1)
}

async fn me(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    (
        StatusCode::OK,
        Json(json!({ "user": { "id": 1, "email": "root@example.com", "name": "Root", "admin": true } })),
    )
}

async fn list_participants(
    State(b): State<Backend>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let participants = b.participants.lock().unwrap().clone();
    (StatusCode::OK, Json(json!({ "participants": participants })))
}

async fn toggle_status(
    State(b): State<Backend>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let id = id_param(&q);
    let status = q.get("status").cloned().unwrap_or_default();
    let mut participants = b.participants.lock().unwrap();
    match participants.iter_mut().find(|p| p["id"] == json!(id)) {
        Some(p) => {
            p["status"] = json!(status);
            (
                StatusCode::OK,
                Json(json!({ "message": "Status updated", "participant": p.clone() })),
            )
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "not found" }))),
    }
}

async fn delete_participant(
    State(b): State<Backend>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let id = id_param(&q);
    let mut participants = b.participants.lock().unwrap();
    let before = participants.len();
    participants.retain(|p| p["id"] != json!(id));
    if participants.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "not found" })));
    }
    (StatusCode::OK, Json(json!({ "message": "Participant deleted" })))
}

async fn list_users(State(b): State<Backend>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let users = b.users.lock().unwrap().clone();
    (StatusCode::OK, Json(json!({ "users": users })))
}

async fn toggle_admin(
    State(b): State<Backend>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let id = id_param(&q);
    if id == 1 {
        // Accepted but refused at the business level.
        return (
            StatusCode::ACCEPTED,
            Json(json!({ "message": "You cannot change your own admin status" })),
        );
    }
    let mut users = b.users.lock().unwrap();
    match users.iter_mut().find(|u| u["id"] == json!(id)) {
        Some(u) => {
            let admin = !u["admin"].as_bool().unwrap_or(false);
            u["admin"] = json!(admin);
            (
                StatusCode::OK,
                Json(json!({ "message": "Admin status updated", "user": u.clone() })),
            )
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "User not found" }))),
    }
}

async fn delete_user(
    State(b): State<Backend>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let id = id_param(&q);
    let mut users = b.users.lock().unwrap();
    let before = users.len();
    users.retain(|u| u["id"] != json!(id));
    if users.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "User not found" })));
    }
    (StatusCode::OK, Json(json!({ "message": "User deleted" })))
}

async fn get_templates(State(b): State<Backend>) -> Json<Value> {
    let templates = b.templates.lock().unwrap().clone();
    Json(json!({ "templates": templates }))
}

async fn create_template(State(b): State<Backend>, Json(t): Json<Value>) -> Json<Value> {
    b.templates.lock().unwrap().push(t.clone());
    Json(json!({ "message": "Template created", "template": t }))
}

async fn update_template(State(b): State<Backend>, Json(t): Json<Value>) -> Json<Value> {
    let mut templates = b.templates.lock().unwrap();
    if let Some(existing) = templates.iter_mut().find(|e| e["id"] == t["id"]) {
        *existing = t;
    }
    Json(json!({ "message": "Template updated" }))
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_backend(backend: Backend) -> String {
    let app = Router::new()
        .route("/api/v1/auth/me", get(me))
        .route("/api/v1/auth/logout", get(|| async { Json(json!({ "message": "Logged out" })) }))
        .route("/api/v1/participants", get(list_participants))
        .route("/api/v1/participants/togglestatus", get(toggle_status))
        .route("/api/v1/participants/delete", delete(delete_participant))
        .route("/api/v1/user/all", get(list_users))
        .route("/api/v1/user/toggleadmin", get(toggle_admin))
        .route("/api/v1/user/delete", delete(delete_user))
        .route("/api/v1/email-templates/get", get(get_templates))
        .route("/api/v1/email-templates/create", post(create_template))
        .route("/api/v1/email-templates/update", post(update_template))
        .route("/broken/participants", get(|| async { "<html>maintenance</html>" }))
        .with_state(backend);
    format!("{}/api/v1", spawn(app).await)
}

fn client(api_url: &str) -> ApiClient {
    ApiClient::new(&Config::for_backend(api_url).with_access_token(TOKEN)).unwrap()
}

#[tokio::test]
async fn session_cookie_is_sent_automatically() {
    let api_url = spawn_backend(Backend::new()).await;

    let signed_in = SessionGuard::new(client(&api_url));
    assert!(matches!(signed_in.guard().await, Access::Granted(ref who) if who.id == "1"));

    let anonymous = SessionGuard::new(ApiClient::new(&Config::for_backend(&api_url)).unwrap());
    assert_eq!(anonymous.guard().await, Access::RedirectToLogin);
}

#[tokio::test]
async fn approve_then_delete_through_the_gate() {
    let backend = Backend::new();
    let api_url = spawn_backend(backend.clone()).await;
    let notifier = Notifier::new();
    let store = CollectionStore::new(ParticipantsResource::new(client(&api_url)), notifier.clone());
    let gate = ConfirmationGate::new(store.clone());

    assert!(store.initialize().await);
    let before = store.snapshot().await;
    assert_eq!(before.len(), 2);
    assert_eq!(before[1].names, vec!["Grace", "Alan"]);
    assert_eq!(before[1].phones.len(), 2);

    gate.request_change(1, ParticipantStatus::Approved)
        .await
        .unwrap();
    assert_eq!(
        backend.participants.lock().unwrap()[0]["status"],
        json!("pending")
    );
    assert!(gate.confirm().await.unwrap());

    let after = store.snapshot().await;
    assert_eq!(after[0].status, ParticipantStatus::Approved);
    assert_eq!(after[1], before[1]);
    assert_eq!(
        notifier.last().unwrap().message,
        "Participant approved successfully"
    );

    gate.request_delete(2).await.unwrap();
    assert!(gate.confirm().await.unwrap());
    assert_eq!(store.len().await, 1);
    assert_eq!(notifier.last().unwrap().message, "Participant deleted");
}

#[tokio::test]
async fn missing_participant_reports_backend_message() {
    let backend = Backend::new();
    let api_url = spawn_backend(backend.clone()).await;
    let notifier = Notifier::new();
    let store = CollectionStore::new(ParticipantsResource::new(client(&api_url)), notifier.clone());
    store.load().await;

    // Someone else removed it on the backend in the meantime.
    backend
        .participants
        .lock()
        .unwrap()
        .retain(|p| p["id"] != json!(2));

    assert!(!store.remove_entity(2).await);
    assert_eq!(store.len().await, 2);
    let last = notifier.last().unwrap();
    assert_eq!(last.level, Level::Error);
    assert_eq!(last.message, "not found");
}

#[tokio::test]
async fn soft_failure_on_admin_toggle_is_informational() {
    let api_url = spawn_backend(Backend::new()).await;
    let notifier = Notifier::new();
    let store = CollectionStore::new(UsersResource::new(client(&api_url)), notifier.clone());
    store.load().await;

    assert!(!store.apply_change(1, &ToggleAdmin).await);
    assert!(store.get(1).await.unwrap().admin);
    let last = notifier.last().unwrap();
    assert_eq!(last.level, Level::Info);
    assert_eq!(last.message, "You cannot change your own admin status");

    assert!(store.apply_change(5, &ToggleAdmin).await);
    assert!(store.get(5).await.unwrap().admin);
    assert_eq!(notifier.last().unwrap().message, "Admin status updated");
}

#[tokio::test]
async fn errors_are_classified() {
    let api_url = spawn_backend(Backend::new()).await;

    let anonymous = ApiClient::new(&Config::for_backend(&api_url)).unwrap();
    assert!(matches!(
        anonymous.participants().await,
        Err(ApiError::Auth { .. })
    ));

    let broken = client(&api_url.replace("/api/v1", "/broken"));
    assert!(matches!(
        broken.participants().await,
        Err(ApiError::Validation { .. })
    ));

    let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_url = format!("http://{}/api/v1", closed.local_addr().unwrap());
    drop(closed);
    assert!(matches!(
        client(&dead_url).participants().await,
        Err(ApiError::Network { .. })
    ));
}

#[tokio::test]
async fn templates_are_seeded_and_saved() {
    let backend = Backend::new();
    let api_url = spawn_backend(backend.clone()).await;
    let templates = TemplateStore::new(client(&api_url), Notifier::new());

    assert!(templates.initialize().await);
    assert_eq!(backend.templates.lock().unwrap().len(), 2);
    assert_eq!(templates.templates().await, EmailTemplate::defaults());

    assert!(templates.save(TemplateKind::Rejection, "Sorry {{name}}").await);
    assert_eq!(
        backend.templates.lock().unwrap()[1]["content"],
        json!("Sorry {{name}}")
    );
}

#[tokio::test]
async fn console_redirects_without_session() {
    let api_url = spawn_backend(Backend::new()).await;
    let anonymous = ApiClient::new(&Config::for_backend(&api_url)).unwrap();
    let console = spawn(router(AppState::new(anonymous))).await;

    let http = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    let resp = http
        .get(format!("{console}/participants"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_redirection());
    assert_eq!(resp.headers()[header::LOCATION], "/login");
}

#[tokio::test]
async fn console_runs_confirm_workflow() {
    let api_url = spawn_backend(Backend::new()).await;
    let console = spawn(router(AppState::new(client(&api_url)))).await;
    let http = reqwest::Client::new();

    let view: Value = http
        .get(format!("{console}/participants?status=pending"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["participants"].as_array().unwrap().len(), 1);
    assert_eq!(view["events"], json!(["Hackathon", "Workshop"]));

    let prompt: Value = http
        .post(format!("{console}/participants/1/status"))
        .json(&json!({ "status": "rejected" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(prompt["title"], "Confirm Status Change");

    let confirmed: Value = http
        .post(format!("{console}/participants/confirm"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(confirmed["applied"], json!(true));

    let again = http
        .post(format!("{console}/participants/confirm"))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::CONFLICT);

    let summary: Value = http
        .get(format!("{console}/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["rejected"], json!(1));
    assert_eq!(summary["approved"], json!(1));

    let notifications: Value = http
        .get(format!("{console}/notifications"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        notifications.as_array().unwrap().last().unwrap()["message"],
        "Participant rejected successfully"
    );
}

#[tokio::test]
async fn console_deletes_user_after_confirmation() {
    let backend = Backend::new();
    let api_url = spawn_backend(backend.clone()).await;
    let console = spawn(router(AppState::new(client(&api_url)))).await;
    let http = reqwest::Client::new();

    let view: Value = http
        .get(format!("{console}/users"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["users"].as_array().unwrap().len(), 2);

    let prompt: Value = http
        .post(format!("{console}/users/5/delete"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(prompt["title"], "Delete User");
    assert_eq!(backend.users.lock().unwrap().len(), 2);

    let confirmed: Value = http
        .post(format!("{console}/users/confirm"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(confirmed["applied"], json!(true));
    assert_eq!(backend.users.lock().unwrap().len(), 1);

    let view: Value = http
        .get(format!("{console}/users"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let users = view["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], json!(1));

    let missing = http
        .post(format!("{console}/users/5/delete"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_delete_reports_backend_message() {
    let backend = Backend::new();
    let api_url = spawn_backend(backend.clone()).await;
    let notifier = Notifier::new();
    let gate = ConfirmationGate::new(CollectionStore::new(
        UsersResource::new(client(&api_url)),
        notifier.clone(),
    ));
    gate.store().load().await;

    gate.request_delete(5).await.unwrap();
    backend.users.lock().unwrap().retain(|u| u["id"] != json!(5));
    assert!(!gate.confirm().await.unwrap());

    assert_eq!(gate.store().len().await, 2);
    assert_eq!(notifier.last().unwrap().message, "User not found");
}

#[tokio::test]
async fn logout_discards_staged_actions_and_cached_data() {
    let backend = Backend::new();
    let api_url = spawn_backend(backend.clone()).await;
    let state = AppState::new(client(&api_url));
    let console = spawn(router(state.clone())).await;
    let http = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    state.participants.store().initialize().await;
    let staged = http
        .post(format!("{console}/participants/1/status"))
        .json(&json!({ "status": "approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(staged.status(), StatusCode::OK);
    state.users.store().initialize().await;
    state.users.request_delete(5).await.unwrap();
    assert!(state.templates.initialize().await);

    let resp = http.post(format!("{console}/logout")).send().await.unwrap();
    assert!(resp.status().is_redirection());
    assert_eq!(resp.headers()[header::LOCATION], "/login");

    assert_eq!(state.participants.prompt(), None);
    assert_eq!(state.participants.confirm().await, Err(GateError::NothingPending));
    assert_eq!(state.users.confirm().await, Err(GateError::NothingPending));
    assert!(state.participants.store().is_empty().await);
    assert!(state.users.store().is_empty().await);
    assert_eq!(
        backend.participants.lock().unwrap()[0]["status"],
        json!("pending")
    );
    assert_eq!(backend.users.lock().unwrap().len(), 2);

    // Templates are fetched again for the next admin.
    backend.templates.lock().unwrap()[0]["content"] = json!("Welcome back {{name}}");
    assert!(state.templates.initialize().await);
    assert_eq!(
        state.templates.get(TemplateKind::Approval).await.unwrap().content,
        "Welcome back {{name}}"
    );
}

