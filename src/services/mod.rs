pub mod api_client;
pub mod collection_store;
pub mod confirmation_gate;
pub mod dashboard_service;
pub mod email_template_service;
pub mod notifications;
pub mod participants_service;
pub mod resources;
pub mod session_guard;

#[cfg(test)]
pub(crate) mod testing;
