use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::models::Identity;
use crate::services::api_client::{ApiClient, Reply};

#[async_trait]
pub trait SessionBackend: Send + Sync + 'static {
    async fn me(&self) -> Result<Identity, ApiError>;
    async fn logout(&self) -> Result<Reply<()>, ApiError>;
}

#[async_trait]
impl SessionBackend for ApiClient {
    async fn me(&self) -> Result<Identity, ApiError> {
        ApiClient::me(self).await
    }

    async fn logout(&self) -> Result<Reply<()>, ApiError> {
        ApiClient::logout(self).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionState {
    // No session check has completed yet.
    Unresolved,
    Anonymous,
    Authenticated(Identity),
}

/// Decision for a protected view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// The first session check has not resolved; render nothing yet.
    Pending,
    Granted(Identity),
    RedirectToLogin,
}

pub struct SessionGuard<B: SessionBackend> {
    backend: Arc<B>,
    state: Arc<RwLock<SessionState>>,
}

impl<B: SessionBackend> Clone for SessionGuard<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            state: Arc::clone(&self.state),
        }
    }
}

impl<B: SessionBackend> SessionGuard<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            state: Arc::new(RwLock::new(SessionState::Unresolved)),
        }
    }

    pub fn current_identity(&self) -> Option<Identity> {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            SessionState::Authenticated(identity) => Some(identity.clone()),
            _ => None,
        }
    }

    /// Asks the backend who is signed in. Any failure counts as "nobody".
    pub async fn check_session(&self) -> Option<Identity> {
        let resolved = match self.backend.me().await {
            Ok(identity) => {
                info!(user_id = %identity.id, "session_valid");
                Some(identity)
            }
            Err(e) => {
                warn!(error = %e, "session_check_failed");
                None
            }
        };

        *self.write() = match &resolved {
            Some(identity) => SessionState::Authenticated(identity.clone()),
            None => SessionState::Anonymous,
        };
        resolved
    }

    pub fn sign_in(&self, identity: Identity) {
        info!(user_id = %identity.id, "signed_in");
        *self.write() = SessionState::Authenticated(identity);
    }

    /// Forgets the identity locally. Invalidating the backend session is up
    /// to the caller, see [`end_session`](Self::end_session).
    pub fn sign_out(&self) -> Option<Identity> {
        let previous = std::mem::replace(&mut *self.write(), SessionState::Anonymous);
        match previous {
            SessionState::Authenticated(identity) => {
                info!(user_id = %identity.id, "signed_out");
                Some(identity)
            }
            _ => None,
        }
    }

    /// Signs out locally, then asks the backend to drop the session.
    pub async fn end_session(&self) -> bool {
        self.sign_out();
        match self.backend.logout().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "backend_logout_failed");
                false
            }
        }
    }

    pub fn access(&self) -> Access {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            SessionState::Unresolved => Access::Pending,
            SessionState::Anonymous => Access::RedirectToLogin,
            SessionState::Authenticated(identity) => Access::Granted(identity.clone()),
        }
    }

    /// Like [`access`](Self::access), but resolves the first session check
    /// instead of answering `Pending`.
    pub async fn guard(&self) -> Access {
        if self.access() == Access::Pending {
            self.check_session().await;
        }
        self.access()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
