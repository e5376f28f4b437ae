use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single call to the registrations backend.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request never produced a response (connect failure, timeout).
    #[error("could not reach {url}: {detail}")]
    Network { url: String, detail: String },

    #[error("session rejected by backend ({status})")]
    Auth {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("backend responded with {status}")]
    Server {
        status: StatusCode,
        message: Option<String>,
    },

    /// The response body did not have the expected shape.
    #[error("malformed response from {url}: {detail}")]
    Validation { url: String, detail: String },

    /// A 2xx other than 200: the call went through but the backend reports a
    /// business-level problem in `message`.
    #[error("backend answered {status} without applying the request")]
    SoftFailure {
        status: StatusCode,
        message: Option<String>,
    },
}

impl ApiError {
    pub fn network(url: &str, err: impl ToString) -> Self {
        Self::Network {
            url: url.to_string(),
            detail: err.to_string(),
        }
    }

    pub fn validation(url: &str, err: impl ToString) -> Self {
        Self::Validation {
            url: url.to_string(),
            detail: err.to_string(),
        }
    }

    /// Classifies a non-200 response using its status and the backend's
    /// `message` field.
    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth { status, message },
            s if s.is_success() => Self::SoftFailure { status, message },
            _ => Self::Server { status, message },
        }
    }

    /// The backend-provided message, if the backend sent one.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Auth { message, .. }
            | Self::Server { message, .. }
            | Self::SoftFailure { message, .. } => {
                message.as_deref().filter(|m| !m.trim().is_empty())
            }
            Self::Network { .. } | Self::Validation { .. } => None,
        }
    }

    pub fn user_message(&self, fallback: &str) -> String {
        self.message().unwrap_or(fallback).to_string()
    }

    pub fn is_soft(&self) -> bool {
        matches!(self, Self::SoftFailure { .. })
    }
}
