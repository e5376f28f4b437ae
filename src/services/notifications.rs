use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::ApiError;

const MAX_QUEUED: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

/// Queue of user-facing messages (the "toasts" of the admin UI).
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    queue: Arc<Mutex<VecDeque<Notification>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, message: impl Into<String>) {
        let message = message.into();
        info!(%message, "✅ notify");
        self.push(Level::Success, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        info!(%message, "ℹ️ notify");
        self.push(Level::Info, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "❌ notify");
        self.push(Level::Error, message);
    }

    /// Soft failures become info messages, everything else an error.
    pub fn failure(&self, err: &ApiError, fallback: &str) {
        let message = err.user_message(fallback);
        if err.is_soft() {
            self.info(message);
        } else {
            self.error(message);
        }
    }

    /// Takes every queued notification, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        self.lock().drain(..).collect()
    }

    pub fn last(&self) -> Option<Notification> {
        self.lock().back().cloned()
    }

    fn push(&self, level: Level, message: String) {
        let mut queue = self.lock();
        if queue.len() == MAX_QUEUED {
            queue.pop_front();
        }
        queue.push_back(Notification { level, message });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Notification>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
