use std::{env, fmt::Display, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
#[error("invalid value for {key}: {detail}")]
pub struct ConfigError {
    pub key: &'static str,
    pub detail: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the registrations backend, e.g. `http://localhost:5001/api/v1`.
    pub api_url: String,
    /// Value of the `access_token` session cookie sent with every backend call.
    pub access_token: Option<String>,
    pub request_timeout: Duration,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let timeout_secs: u64 = try_load("ADMIN_REQUEST_TIMEOUT_SECS", "15")?;

        Ok(Self {
            api_url: try_load("ADMIN_API_URL", "http://localhost:5001/api/v1")?,
            access_token: var("ADMIN_ACCESS_TOKEN")
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            request_timeout: Duration::from_secs(timeout_secs.max(1)),
            host: try_load("HOST", "127.0.0.1")?,
            port: try_load("PORT", "3000")?,
        })
    }

    pub fn for_backend(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            access_token: None,
            request_timeout: Duration::from_secs(15),
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn var(key: &str) -> Option<String> {
    let value = env::var(key).ok();
    if value.is_none() {
        info!("{key} not set");
    }
    value
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} using default: {default}");
            default.to_string()
        })
        .trim()
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError {
                key,
                detail: e.to_string(),
            }
        })
}
