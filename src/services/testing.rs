//! In-memory stand-ins for the backend used by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::error::ApiError;
use crate::models::{Participant, ParticipantStatus};
use crate::services::api_client::Reply;
use crate::services::confirmation_gate::Prompt;
use crate::services::resources::{ParticipantsResource, Resource};

pub fn participant(id: i64, status: ParticipantStatus) -> Participant {
    Participant {
        id,
        names: vec![format!("Participant {id}")],
        email: format!("p{id}@example.com"),
        phones: vec!["0600000000".to_string()],
        event: "Hackathon".to_string(),
        event_date: Some("March 15, 2024".to_string()),
        event_location: Some("Utrecht".to_string()),
        amount_paid: 25.0,
        payment_method: Some("upi".to_string()),
        transaction_id: Some(format!("tx-{id}")),
        transaction_screenshot: None,
        status,
        created_at: "2024-03-01T10:00:00Z".to_string(),
    }
}

type FetchResult = Result<Vec<Participant>, ApiError>;

#[derive(Default)]
struct FakeState {
    remote: Mutex<Vec<Participant>>,
    held_fetches: Mutex<VecDeque<oneshot::Receiver<FetchResult>>>,
    fetch_errors: Mutex<VecDeque<ApiError>>,
    mutate_errors: Mutex<VecDeque<ApiError>>,
    remove_errors: Mutex<VecDeque<ApiError>>,
    held_mutation: Mutex<Option<oneshot::Receiver<()>>>,
    fetch_calls: AtomicUsize,
    mutate_calls: AtomicUsize,
    remove_calls: AtomicUsize,
}

/// Participants backend whose answers the test controls.
#[derive(Clone, Default)]
pub struct FakeParticipants {
    state: Arc<FakeState>,
}

impl FakeParticipants {
    pub fn with(remote: Vec<Participant>) -> Self {
        let fake = Self::default();
        *fake.state.remote.lock().unwrap() = remote;
        fake
    }

    pub fn hold_fetch(&self, rx: oneshot::Receiver<FetchResult>) {
        self.state.held_fetches.lock().unwrap().push_back(rx);
    }

    /// The next mutation waits until the returned sender fires (or drops).
    pub fn hold_next_mutation(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.state.held_mutation.lock().unwrap() = Some(rx);
        tx
    }

    pub fn fail_next_fetch(&self, err: ApiError) {
        self.state.fetch_errors.lock().unwrap().push_back(err);
    }

    pub fn fail_next_mutate(&self, err: ApiError) {
        self.state.mutate_errors.lock().unwrap().push_back(err);
    }

    pub fn fail_next_remove(&self, err: ApiError) {
        self.state.remove_errors.lock().unwrap().push_back(err);
    }

    pub fn fetch_calls(&self) -> usize {
        self.state.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn mutate_calls(&self) -> usize {
        self.state.mutate_calls.load(Ordering::SeqCst)
    }

    pub fn remove_calls(&self) -> usize {
        self.state.remove_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Resource for FakeParticipants {
    type Entity = Participant;
    type Change = ParticipantStatus;
    type Patch = ParticipantStatus;

    const LABEL: &'static str = "participant";

    async fn fetch_all(&self) -> Result<Vec<Participant>, ApiError> {
        self.state.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let held = self.state.held_fetches.lock().unwrap().pop_front();
        if let Some(rx) = held {
            return rx
                .await
                .unwrap_or_else(|e| Err(ApiError::network("fake://participants", e)));
        }
        if let Some(err) = self.state.fetch_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(self.state.remote.lock().unwrap().clone())
    }

    async fn mutate(
        &self,
        id: i64,
        change: &ParticipantStatus,
    ) -> Result<Reply<ParticipantStatus>, ApiError> {
        self.state.mutate_calls.fetch_add(1, Ordering::SeqCst);
        let held = self.state.held_mutation.lock().unwrap().take();
        if let Some(rx) = held {
            let _ = rx.await;
        }
        if let Some(err) = self.state.mutate_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        let mut remote = self.state.remote.lock().unwrap();
        if let Some(p) = remote.iter_mut().find(|p| p.id == id) {
            p.status = *change;
        }
        Ok(Reply::new(*change).with_message("Status updated"))
    }

    async fn remove(&self, id: i64) -> Result<Reply<()>, ApiError> {
        self.state.remove_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.state.remove_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.state.remote.lock().unwrap().retain(|p| p.id != id);
        Ok(Reply::new(()))
    }

    fn apply_patch(entity: &mut Participant, patch: ParticipantStatus) {
        ParticipantsResource::apply_patch(entity, patch)
    }

    fn allows(entity: &Participant, change: &ParticipantStatus) -> bool {
        ParticipantsResource::allows(entity, change)
    }

    fn change_prompt(entity: &Participant, change: &ParticipantStatus) -> Prompt {
        ParticipantsResource::change_prompt(entity, change)
    }

    fn change_succeeded(change: &ParticipantStatus, backend_message: Option<&str>) -> String {
        ParticipantsResource::change_succeeded(change, backend_message)
    }
}
