use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::services::collection_store::CollectionStore;
use crate::services::resources::Resource;

/// Title and message of a confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction<C> {
    Change { id: i64, change: C },
    Delete { id: i64 },
}

impl<C> PendingAction<C> {
    pub fn id(&self) -> i64 {
        match self {
            Self::Change { id, .. } | Self::Delete { id } => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState<C> {
    Idle,
    AwaitingConfirmation {
        action: PendingAction<C>,
        prompt: Prompt,
    },
    Processing {
        action: PendingAction<C>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("another action is still being processed")]
    Busy,
    #[error("no action is waiting for confirmation")]
    NothingPending,
    #[error("no {label} with id {id}")]
    UnknownEntity { label: &'static str, id: i64 },
    #[error("this {label} cannot take that change")]
    NotAllowed { label: &'static str },
}

/// Holds a destructive or status-changing action until an admin confirms
/// it, then runs it against the store. One action per view at a time.
pub struct ConfirmationGate<R: Resource> {
    store: CollectionStore<R>,
    state: Arc<Mutex<GateState<R::Change>>>,
}

impl<R: Resource> Clone for ConfirmationGate<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

// Puts the gate back to Idle once the dispatched operation settles, even if
// the confirming future is dropped midway.
struct Settle<'a, C>(&'a Mutex<GateState<C>>);

impl<C> Drop for Settle<'_, C> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = GateState::Idle;
    }
}

impl<R: Resource> ConfirmationGate<R> {
    pub fn new(store: CollectionStore<R>) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(GateState::Idle)),
        }
    }

    pub fn store(&self) -> &CollectionStore<R> {
        &self.store
    }

    pub fn state(&self) -> GateState<R::Change> {
        self.lock().clone()
    }

    pub fn prompt(&self) -> Option<Prompt> {
        match &*self.lock() {
            GateState::AwaitingConfirmation { prompt, .. } => Some(prompt.clone()),
            _ => None,
        }
    }

    /// Id of the entity whose controls should be disabled right now.
    pub fn processing_id(&self) -> Option<i64> {
        match &*self.lock() {
            GateState::Processing { action } => Some(action.id()),
            _ => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(*self.lock(), GateState::Processing { .. })
    }

    pub async fn request_change(&self, id: i64, change: R::Change) -> Result<Prompt, GateError> {
        self.ensure_not_busy()?;
        let entity = self.store.get(id).await.ok_or(GateError::UnknownEntity {
            label: R::LABEL,
            id,
        })?;
        if !R::allows(&entity, &change) {
            return Err(GateError::NotAllowed { label: R::LABEL });
        }
        let prompt = R::change_prompt(&entity, &change);
        self.stage(PendingAction::Change { id, change }, prompt)
    }

    pub async fn request_delete(&self, id: i64) -> Result<Prompt, GateError> {
        self.ensure_not_busy()?;
        let entity = self.store.get(id).await.ok_or(GateError::UnknownEntity {
            label: R::LABEL,
            id,
        })?;
        let prompt = R::delete_prompt(&entity);
        self.stage(PendingAction::Delete { id }, prompt)
    }

    /// Runs the pending action. Returns whether the store applied it; the
    /// gate is Idle again afterwards either way.
    pub async fn confirm(&self) -> Result<bool, GateError> {
        let action = {
            let mut state = self.lock();
            let action = match &*state {
                GateState::AwaitingConfirmation { action, .. } => action.clone(),
                GateState::Processing { .. } => return Err(GateError::Busy),
                GateState::Idle => return Err(GateError::NothingPending),
            };
            *state = GateState::Processing {
                action: action.clone(),
            };
            action
        };
        let _settle = Settle(&*self.state);

        info!(resource = R::LABEL, id = action.id(), "action_confirmed");
        let applied = match &action {
            PendingAction::Change { id, change } => self.store.apply_change(*id, change).await,
            PendingAction::Delete { id } => self.store.remove_entity(*id).await,
        };
        Ok(applied)
    }

    pub fn cancel(&self) -> Result<PendingAction<R::Change>, GateError> {
        let mut state = self.lock();
        match std::mem::replace(&mut *state, GateState::Idle) {
            GateState::AwaitingConfirmation { action, .. } => {
                debug!(resource = R::LABEL, id = action.id(), "action_cancelled");
                Ok(action)
            }
            GateState::Processing { action } => {
                *state = GateState::Processing { action };
                Err(GateError::Busy)
            }
            GateState::Idle => Err(GateError::NothingPending),
        }
    }

    /// Discards an action still awaiting confirmation. An action already
    /// being processed is left to settle on its own.
    pub fn reset(&self) -> Option<PendingAction<R::Change>> {
        let mut state = self.lock();
        let GateState::AwaitingConfirmation { action, .. } = &*state else {
            return None;
        };
        let action = action.clone();
        *state = GateState::Idle;
        debug!(resource = R::LABEL, id = action.id(), "pending_action_discarded");
        Some(action)
    }

    fn ensure_not_busy(&self) -> Result<(), GateError> {
        if self.is_busy() {
            return Err(GateError::Busy);
        }
        Ok(())
    }

    fn stage(&self, action: PendingAction<R::Change>, prompt: Prompt) -> Result<Prompt, GateError> {
        let mut state = self.lock();
        // Re-check: the store lookup awaited and another confirm may have started.
        if matches!(*state, GateState::Processing { .. }) {
            return Err(GateError::Busy);
        }
        debug!(resource = R::LABEL, id = action.id(), "action_awaiting_confirmation");
        *state = GateState::AwaitingConfirmation {
            action,
            prompt: prompt.clone(),
        };
        Ok(prompt)
    }

    fn lock(&self) -> MutexGuard<'_, GateState<R::Change>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
