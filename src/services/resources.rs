use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::{Participant, ParticipantStatus, User};
use crate::services::api_client::{ApiClient, Reply};
use crate::services::confirmation_gate::Prompt;

pub trait Entity: Clone + Debug + Send + Sync + 'static {
    fn id(&self) -> i64;
}

impl Entity for Participant {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Entity for User {
    fn id(&self) -> i64 {
        self.id
    }
}

/// A named backend collection together with the rules for changing one of
/// its entries. `Change` is what an admin asks for, `Patch` is what the
/// backend confirms.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    type Entity: Entity;
    type Change: Clone + Debug + Send + Sync + 'static;
    type Patch: Send + 'static;

    /// Singular noun used in messages ("participant").
    const LABEL: &'static str;

    async fn fetch_all(&self) -> Result<Vec<Self::Entity>, ApiError>;

    async fn mutate(&self, id: i64, change: &Self::Change) -> Result<Reply<Self::Patch>, ApiError>;

    async fn remove(&self, id: i64) -> Result<Reply<()>, ApiError>;

    /// Writes the confirmed field into the local entity; nothing else changes.
    fn apply_patch(entity: &mut Self::Entity, patch: Self::Patch);

    fn allows(_entity: &Self::Entity, _change: &Self::Change) -> bool {
        true
    }

    fn change_prompt(entity: &Self::Entity, change: &Self::Change) -> Prompt;

    fn change_succeeded(change: &Self::Change, backend_message: Option<&str>) -> String;

    fn delete_prompt(_entity: &Self::Entity) -> Prompt {
        Prompt {
            title: format!("Delete {}", capitalize(Self::LABEL)),
            message: format!("Are you sure you want to delete this {}?", Self::LABEL),
        }
    }

    fn delete_succeeded(backend_message: Option<&str>) -> String {
        backend_message
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} deleted successfully", capitalize(Self::LABEL)))
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone)]
pub struct ParticipantsResource {
    client: ApiClient,
}

impl ParticipantsResource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for ParticipantsResource {
    type Entity = Participant;
    type Change = ParticipantStatus;
    type Patch = ParticipantStatus;

    const LABEL: &'static str = "participant";

    async fn fetch_all(&self) -> Result<Vec<Participant>, ApiError> {
        self.client.participants().await
    }

    async fn mutate(
        &self,
        id: i64,
        change: &ParticipantStatus,
    ) -> Result<Reply<ParticipantStatus>, ApiError> {
        self.client.set_participant_status(id, *change).await
    }

    async fn remove(&self, id: i64) -> Result<Reply<()>, ApiError> {
        self.client.delete_participant(id).await
    }

    fn apply_patch(entity: &mut Participant, patch: ParticipantStatus) {
        entity.status = patch;
    }

    fn allows(entity: &Participant, change: &ParticipantStatus) -> bool {
        entity.status.can_become(*change)
    }

    fn change_prompt(_entity: &Participant, change: &ParticipantStatus) -> Prompt {
        Prompt {
            title: "Confirm Status Change".to_string(),
            message: format!(
                "Are you sure you want to {} this participant? This action cannot be undone.",
                change.verb()
            ),
        }
    }

    fn change_succeeded(change: &ParticipantStatus, _backend_message: Option<&str>) -> String {
        format!("Participant {} successfully", change)
    }
}

#[derive(Debug, Clone)]
pub struct UsersResource {
    client: ApiClient,
}

impl UsersResource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

/// The only change a user supports: flip the admin flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleAdmin;

#[async_trait]
impl Resource for UsersResource {
    type Entity = User;
    type Change = ToggleAdmin;
    type Patch = bool;

    const LABEL: &'static str = "user";

    async fn fetch_all(&self) -> Result<Vec<User>, ApiError> {
        self.client.users().await
    }

    async fn mutate(&self, id: i64, _change: &ToggleAdmin) -> Result<Reply<bool>, ApiError> {
        self.client.toggle_admin(id).await
    }

    async fn remove(&self, id: i64) -> Result<Reply<()>, ApiError> {
        self.client.delete_user(id).await
    }

    fn apply_patch(entity: &mut User, patch: bool) {
        entity.admin = patch;
    }

    fn change_prompt(entity: &User, _change: &ToggleAdmin) -> Prompt {
        if entity.admin {
            Prompt {
                title: "Deactivate User".to_string(),
                message: "Are you sure you want to deactivate this user?".to_string(),
            }
        } else {
            Prompt {
                title: "Activate User".to_string(),
                message: "Are you sure you want to activate this user?".to_string(),
            }
        }
    }

    fn change_succeeded(_change: &ToggleAdmin, backend_message: Option<&str>) -> String {
        backend_message
            .map(str::to_string)
            .unwrap_or_else(|| "User admin status updated".to_string())
    }
}
