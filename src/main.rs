use std::net::SocketAddr;

use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use registration_admin::config::Config;
use registration_admin::services::api_client::ApiClient;
use registration_admin::web::{router, AppState};

#[tokio::main]
async fn main() {
    dotenv().ok();

    // 1. Start logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 2. Configuration and backend client
    let config = Config::load().expect("Environment misconfigured");
    println!("🔌 Registrations backend: {}", config.api_url);
    if config.access_token.is_none() {
        tracing::warn!("ADMIN_ACCESS_TOKEN not set, the backend will see an anonymous session");
    }
    let client = ApiClient::new(&config).expect("Cannot build backend client");

    // 3. Stores, then the router on top of them
    let state = AppState::new(client);
    if state.session.check_session().await.is_none() {
        tracing::warn!("No admin session yet, protected pages redirect to /login");
    }
    let app = router(state);

    // 4. Serve
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .expect("Cannot parse host/port");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Cannot bind listener");

    println!("🚀 Admin console on http://{}", addr);
    axum::serve(listener, app).await.expect("Server error");
}
