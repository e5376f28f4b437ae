use crate::services::api_client::ApiClient;
use crate::services::collection_store::CollectionStore;
use crate::services::confirmation_gate::ConfirmationGate;
use crate::services::email_template_service::TemplateStore;
use crate::services::notifications::Notifier;
use crate::services::resources::{ParticipantsResource, UsersResource};
use crate::services::session_guard::SessionGuard;

/// Per-process stores shared by every handler. Built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub session: SessionGuard<ApiClient>,
    pub participants: ConfirmationGate<ParticipantsResource>,
    pub users: ConfirmationGate<UsersResource>,
    pub templates: TemplateStore<ApiClient>,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(client: ApiClient) -> Self {
        let notifier = Notifier::new();
        let participants = CollectionStore::new(
            ParticipantsResource::new(client.clone()),
            notifier.clone(),
        );
        let users = CollectionStore::new(UsersResource::new(client.clone()), notifier.clone());

        Self {
            session: SessionGuard::new(client.clone()),
            participants: ConfirmationGate::new(participants),
            users: ConfirmationGate::new(users),
            templates: TemplateStore::new(client, notifier.clone()),
            notifier,
        }
    }

    /// Drops everything cached for the current admin.
    pub async fn teardown(&self) {
        self.participants.reset();
        self.users.reset();
        self.participants.store().teardown().await;
        self.users.store().teardown().await;
        self.templates.teardown().await;
        self.notifier.drain();
    }
}
