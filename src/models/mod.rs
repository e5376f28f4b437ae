pub mod email_templates;
pub mod identity;
pub mod participants;
pub mod users;

pub use email_templates::{EmailTemplate, PreviewData, RenderedEmail, TemplateKind};
pub use identity::Identity;
pub use participants::{Participant, ParticipantStatus};
pub use users::User;
