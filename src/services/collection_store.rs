use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::services::notifications::Notifier;
use crate::services::resources::{Entity, Resource};

struct Collection<E> {
    entities: Vec<E>,
    // Sequence number of the load whose data is currently held.
    applied_seq: u64,
}

struct Inner<R: Resource> {
    resource: R,
    notifier: Notifier,
    state: RwLock<Collection<R::Entity>>,
    issued: AtomicU64,
    in_flight: AtomicUsize,
    initialized: AtomicBool,
}

/// In-memory copy of one backend collection. Changes are applied only after
/// the backend confirms them, and failures end up as notifications instead
/// of errors.
pub struct CollectionStore<R: Resource> {
    inner: Arc<Inner<R>>,
}

impl<R: Resource> Clone for CollectionStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<R: Resource> CollectionStore<R> {
    pub fn new(resource: R, notifier: Notifier) -> Self {
        Self {
            inner: Arc::new(Inner {
                resource,
                notifier,
                state: RwLock::new(Collection {
                    entities: Vec::new(),
                    applied_seq: 0,
                }),
                issued: AtomicU64::new(0),
                in_flight: AtomicUsize::new(0),
                initialized: AtomicBool::new(false),
            }),
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    /// First load for the owning scope. Later calls do nothing until
    /// [`teardown`](Self::teardown).
    pub async fn initialize(&self) -> bool {
        if self.inner.initialized.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.load().await
    }

    pub async fn teardown(&self) {
        self.inner.initialized.store(false, Ordering::SeqCst);
        let mut state = self.inner.state.write().await;
        state.entities.clear();
        // Anything still in flight belongs to the old session.
        state.applied_seq = self.inner.issued.load(Ordering::SeqCst);
    }

    /// Replaces the collection with a fresh fetch. Returns whether this
    /// call's data ended up in the store; a response older than the one
    /// already applied is dropped.
    pub async fn load(&self) -> bool {
        let seq = self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let _loading = InFlight::enter(&self.inner.in_flight);

        match self.inner.resource.fetch_all().await {
            Ok(entities) => {
                let mut state = self.inner.state.write().await;
                if seq <= state.applied_seq {
                    debug!(resource = R::LABEL, seq, applied = state.applied_seq, "stale_load_dropped");
                    return false;
                }
                info!(resource = R::LABEL, seq, count = entities.len(), "collection_loaded");
                state.applied_seq = seq;
                state.entities = entities;
                true
            }
            Err(e) => {
                warn!(resource = R::LABEL, seq, error = %e, "collection_load_failed");
                self.inner
                    .notifier
                    .failure(&e, &format!("Error fetching {}s", R::LABEL));
                false
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst) > 0
    }

    pub async fn snapshot(&self) -> Vec<R::Entity> {
        self.inner.state.read().await.entities.clone()
    }

    pub async fn get(&self, id: i64) -> Option<R::Entity> {
        self.inner
            .state
            .read()
            .await
            .entities
            .iter()
            .find(|e| e.id() == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.state.read().await.entities.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Asks the backend for `change` and, once it agrees, patches the single
    /// matching entity in place.
    pub async fn apply_change(&self, id: i64, change: &R::Change) -> bool {
        match self.inner.resource.mutate(id, change).await {
            Ok(reply) => {
                let message = R::change_succeeded(change, reply.message.as_deref());
                {
                    let mut state = self.inner.state.write().await;
                    match state.entities.iter_mut().find(|e| e.id() == id) {
                        Some(entity) => R::apply_patch(entity, reply.data),
                        None => debug!(resource = R::LABEL, id, "changed_entity_not_loaded"),
                    }
                    self.supersede_in_flight(&mut state);
                }
                info!(resource = R::LABEL, id, ?change, "entity_changed");
                self.inner.notifier.success(message);
                true
            }
            Err(e) => {
                warn!(resource = R::LABEL, id, ?change, error = %e, "entity_change_failed");
                self.inner
                    .notifier
                    .failure(&e, &format!("Error updating {}", R::LABEL));
                false
            }
        }
    }

    pub async fn remove_entity(&self, id: i64) -> bool {
        match self.inner.resource.remove(id).await {
            Ok(reply) => {
                {
                    let mut state = self.inner.state.write().await;
                    state.entities.retain(|e| e.id() != id);
                    self.supersede_in_flight(&mut state);
                }
                info!(resource = R::LABEL, id, "entity_removed");
                self.inner
                    .notifier
                    .success(R::delete_succeeded(reply.message.as_deref()));
                true
            }
            Err(e) => {
                warn!(resource = R::LABEL, id, error = %e, "entity_remove_failed");
                self.inner
                    .notifier
                    .failure(&e, &format!("Error deleting {}", R::LABEL));
                false
            }
        }
    }

    // Loads issued before a confirmed change may carry the pre-change
    // snapshot; they must not overwrite it.
    fn supersede_in_flight(&self, state: &mut Collection<R::Entity>) {
        let issued = self.inner.issued.load(Ordering::SeqCst);
        state.applied_seq = state.applied_seq.max(issued);
    }
}
