use std::sync::Arc;

use cookie::Cookie;
use reqwest::cookie::Jar;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{EmailTemplate, Identity, Participant, ParticipantStatus, User};

/// Successful backend answer: the payload plus the optional `message` the
/// backend attaches for notifications.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply<T> {
    pub message: Option<String>,
    pub data: T,
}

impl<T> Reply<T> {
    pub fn new(data: T) -> Self {
        Self {
            message: None,
            data,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        Reply {
            message: self.message,
            data: f(self.data),
        }
    }
}

#[derive(Deserialize)]
struct StatusOnly {
    status: ParticipantStatus,
}

#[derive(Deserialize)]
struct AdminOnly {
    admin: bool,
}

/// HTTP client for the registrations backend. The session cookie lives in
/// the client's jar, so every request carries it.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let base_url = config.api_url.trim_end_matches('/').to_string();
        let parsed = Url::parse(&base_url).map_err(|e| ApiError::validation(&base_url, e))?;

        let jar = Arc::new(Jar::default());
        if let Some(token) = &config.access_token {
            let mut session = Cookie::new("access_token", token.clone());
            session.set_path("/");
            session.set_http_only(true);
            jar.add_cookie_str(&session.to_string(), &parsed);
        }

        let http = Client::builder()
            .cookie_provider(jar)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::network(&base_url, e))?;

        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn participants(&self) -> Result<Vec<Participant>, ApiError> {
        let url = self.url("/participants");
        let reply = self
            .send(self.http.get(&url), &url, Some("participants"))
            .await?;
        Ok(reply.data)
    }

    pub async fn set_participant_status(
        &self,
        id: i64,
        status: ParticipantStatus,
    ) -> Result<Reply<ParticipantStatus>, ApiError> {
        let url = self.url("/participants/togglestatus");
        let request = self
            .http
            .get(&url)
            .query(&[("id", id.to_string()), ("status", status.to_string())]);
        let reply: Reply<StatusOnly> = self.send(request, &url, Some("participant")).await?;
        Ok(reply.map(|p| p.status))
    }

    pub async fn delete_participant(&self, id: i64) -> Result<Reply<()>, ApiError> {
        let url = self.url("/participants/delete");
        let request = self.http.delete(&url).query(&[("id", id)]);
        self.send(request, &url, None).await
    }

    pub async fn users(&self) -> Result<Vec<User>, ApiError> {
        let url = self.url("/user/all");
        let reply = self.send(self.http.get(&url), &url, Some("users")).await?;
        Ok(reply.data)
    }

    pub async fn toggle_admin(&self, id: i64) -> Result<Reply<bool>, ApiError> {
        let url = self.url("/user/toggleadmin");
        let request = self.http.get(&url).query(&[("id", id)]);
        let reply: Reply<AdminOnly> = self.send(request, &url, Some("user")).await?;
        Ok(reply.map(|u| u.admin))
    }

    pub async fn delete_user(&self, id: i64) -> Result<Reply<()>, ApiError> {
        let url = self.url("/user/delete");
        let request = self.http.delete(&url).query(&[("id", id)]);
        self.send(request, &url, None).await
    }

    pub async fn email_templates(&self) -> Result<Vec<EmailTemplate>, ApiError> {
        let url = self.url("/email-templates/get");
        let reply = self
            .send(self.http.get(&url), &url, Some("templates"))
            .await?;
        Ok(reply.data)
    }

    pub async fn create_email_template(
        &self,
        template: &EmailTemplate,
    ) -> Result<Reply<EmailTemplate>, ApiError> {
        let url = self.url("/email-templates/create");
        let request = self.http.post(&url).json(template);
        self.send(request, &url, Some("template")).await
    }

    pub async fn update_email_template(
        &self,
        template: &EmailTemplate,
    ) -> Result<Reply<()>, ApiError> {
        let url = self.url("/email-templates/update");
        let request = self.http.post(&url).json(template);
        self.send(request, &url, None).await
    }

    pub async fn me(&self) -> Result<Identity, ApiError> {
        let url = self.url("/auth/me");
        let reply = self.send(self.http.get(&url), &url, Some("user")).await?;
        Ok(reply.data)
    }

    pub async fn logout(&self) -> Result<Reply<()>, ApiError> {
        let url = self.url("/auth/logout");
        self.send(self.http.get(&url), &url, None).await
    }

    /// Sends the request and unwraps the JSON envelope. Only a 200 counts as
    /// success; `field` names the envelope key holding the payload.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
        field: Option<&str>,
    ) -> Result<Reply<T>, ApiError> {
        let resp = request.send().await.map_err(|e| {
            warn!(url, error = %e, "backend_unreachable");
            ApiError::network(url, e)
        })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| ApiError::network(url, e))?;
        let body: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(v) => v,
                Err(e) if status == StatusCode::OK => return Err(ApiError::validation(url, e)),
                Err(_) => Value::Null,
            }
        };
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);

        if status != StatusCode::OK {
            warn!(url, %status, message = ?message, "backend_call_failed");
            return Err(ApiError::from_status(status, message));
        }
        debug!(url, %status, "backend_call_ok");

        let payload = match field {
            Some(name) => body
                .get(name)
                .cloned()
                .ok_or_else(|| ApiError::validation(url, format!("missing `{name}` field")))?,
            None => Value::Null,
        };
        let data = serde_json::from_value(payload).map_err(|e| ApiError::validation(url, e))?;

        Ok(Reply { message, data })
    }
}
