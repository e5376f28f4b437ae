use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::models::{EmailTemplate, Participant, PreviewData, RenderedEmail, TemplateKind};
use crate::services::api_client::{ApiClient, Reply};
use crate::services::notifications::Notifier;

#[async_trait]
pub trait TemplateBackend: Send + Sync + 'static {
    async fn fetch(&self) -> Result<Vec<EmailTemplate>, ApiError>;
    async fn create(&self, template: &EmailTemplate) -> Result<Reply<EmailTemplate>, ApiError>;
    async fn update(&self, template: &EmailTemplate) -> Result<Reply<()>, ApiError>;
}

#[async_trait]
impl TemplateBackend for ApiClient {
    async fn fetch(&self) -> Result<Vec<EmailTemplate>, ApiError> {
        self.email_templates().await
    }

    async fn create(&self, template: &EmailTemplate) -> Result<Reply<EmailTemplate>, ApiError> {
        self.create_email_template(template).await
    }

    async fn update(&self, template: &EmailTemplate) -> Result<Reply<()>, ApiError> {
        self.update_email_template(template).await
    }
}

struct Inner<B> {
    backend: B,
    notifier: Notifier,
    templates: RwLock<Vec<EmailTemplate>>,
    saving: AtomicBool,
    initialized: AtomicBool,
}

/// The approval and rejection emails. Starts with the built-in defaults and
/// syncs with the backend, seeding it when it has no (or an incomplete) set.
pub struct TemplateStore<B: TemplateBackend> {
    inner: Arc<Inner<B>>,
}

impl<B: TemplateBackend> Clone for TemplateStore<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Saving<'a>(&'a AtomicBool);

impl Drop for Saving<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<B: TemplateBackend> TemplateStore<B> {
    pub fn new(backend: B, notifier: Notifier) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                notifier,
                templates: RwLock::new(EmailTemplate::defaults()),
                saving: AtomicBool::new(false),
                initialized: AtomicBool::new(false),
            }),
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    pub fn is_saving(&self) -> bool {
        self.inner.saving.load(Ordering::SeqCst)
    }

    pub async fn templates(&self) -> Vec<EmailTemplate> {
        self.inner.templates.read().await.clone()
    }

    pub async fn get(&self, kind: TemplateKind) -> Option<EmailTemplate> {
        self.inner
            .templates
            .read()
            .await
            .iter()
            .find(|t| t.id == kind)
            .cloned()
    }

    /// Fetches the backend's templates once; seeds the defaults when the
    /// backend does not hold exactly one template per kind.
    pub async fn initialize(&self) -> bool {
        if self.inner.initialized.swap(true, Ordering::SeqCst) {
            return false;
        }

        let fetched = match self.inner.backend.fetch().await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "email_templates_fetch_failed");
                self.inner.notifier.failure(&e, "Error fetching templates");
                self.inner.initialized.store(false, Ordering::SeqCst);
                return false;
            }
        };

        if is_complete(&fetched) {
            info!(count = fetched.len(), "email_templates_loaded");
            *self.inner.templates.write().await = order(fetched);
            return true;
        }

        info!(found = fetched.len(), "📧 seeding default email templates");
        let mut seeded = Vec::with_capacity(TemplateKind::ALL.len());
        for template in EmailTemplate::defaults() {
            match self.inner.backend.create(&template).await {
                Ok(reply) => seeded.push(reply.data),
                Err(e) => {
                    warn!(id = %template.id, error = %e, "email_template_seed_failed");
                    self.inner.notifier.failure(&e, "Error creating template");
                    self.inner.initialized.store(false, Ordering::SeqCst);
                    return false;
                }
            }
        }

        *self.inner.templates.write().await = order(seeded);
        self.inner.notifier.success("Templates created successfully");
        true
    }

    /// Forgets the synced set; the next [`initialize`](Self::initialize)
    /// fetches again.
    pub async fn teardown(&self) {
        *self.inner.templates.write().await = EmailTemplate::defaults();
        self.inner.initialized.store(false, Ordering::SeqCst);
    }

    /// Persists new body content for one template. Empty content is refused
    /// before anything is sent.
    pub async fn save(&self, kind: TemplateKind, content: &str) -> bool {
        if content.trim().is_empty() {
            self.inner.notifier.error("Template content cannot be empty");
            return false;
        }
        let Some(mut template) = self.get(kind).await else {
            self.inner
                .notifier
                .error(format!("Unknown email template: {kind}"));
            return false;
        };
        template.content = content.to_string();

        self.inner.saving.store(true, Ordering::SeqCst);
        let _saving = Saving(&self.inner.saving);

        match self.inner.backend.update(&template).await {
            Ok(reply) => {
                if let Some(stored) = self
                    .inner
                    .templates
                    .write()
                    .await
                    .iter_mut()
                    .find(|t| t.id == kind)
                {
                    stored.content = template.content;
                }
                info!(id = %kind, "email_template_saved");
                self.inner
                    .notifier
                    .success(reply.message.unwrap_or_else(|| "Template saved".to_string()));
                true
            }
            Err(e) => {
                warn!(id = %kind, error = %e, "email_template_save_failed");
                self.inner.notifier.failure(&e, "Error saving template");
                false
            }
        }
    }

    pub async fn preview(&self, kind: TemplateKind, data: &PreviewData) -> Option<RenderedEmail> {
        self.get(kind).await.map(|t| t.render(data))
    }

    pub async fn render_for(
        &self,
        kind: TemplateKind,
        participant: &Participant,
    ) -> Option<RenderedEmail> {
        self.preview(kind, &PreviewData::for_participant(participant))
            .await
    }
}

fn is_complete(templates: &[EmailTemplate]) -> bool {
    templates.len() == TemplateKind::ALL.len()
        && TemplateKind::ALL
            .iter()
            .all(|kind| templates.iter().filter(|t| t.id == *kind).count() == 1)
        && templates.iter().all(|t| !t.content.trim().is_empty())
}

fn order(mut templates: Vec<EmailTemplate>) -> Vec<EmailTemplate> {
    templates.sort_by_key(|t| t.id);
    templates
}
