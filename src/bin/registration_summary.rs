use dotenvy::dotenv;

use registration_admin::config::Config;
use registration_admin::services::api_client::ApiClient;
use registration_admin::services::collection_store::CollectionStore;
use registration_admin::services::dashboard_service::DashboardSummary;
use registration_admin::services::notifications::Notifier;
use registration_admin::services::resources::ParticipantsResource;
use registration_admin::services::session_guard::{Access, SessionGuard};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            std::process::exit(2);
        }
    };
    let client = match ApiClient::new(&config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("cannot build backend client: {}", e);
            std::process::exit(2);
        }
    };

    let session = SessionGuard::new(client.clone());
    let Access::Granted(admin) = session.guard().await else {
        eprintln!("not signed in: set ADMIN_ACCESS_TOKEN to a valid session token");
        std::process::exit(1);
    };

    let notifier = Notifier::new();
    let participants = CollectionStore::new(ParticipantsResource::new(client), notifier.clone());
    if !participants.initialize().await {
        for n in notifier.drain() {
            eprintln!("{}", n.message);
        }
        std::process::exit(1);
    }

    let summary = DashboardSummary::from_participants(&participants.snapshot().await);
    println!("registrations for {} <{}>", admin.name, admin.email);
    println!("  total: {}", summary.total);
    for (label, count) in summary.status_breakdown() {
        println!("  {}: {}", label.to_lowercase(), count);
    }
    for entry in &summary.by_event {
        println!("  event {:?}: {}", entry.event, entry.count);
    }
}
