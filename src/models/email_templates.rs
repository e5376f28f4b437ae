use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::Participant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Approval,
    Rejection,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 2] = [Self::Approval, Self::Rejection];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approval => "approval",
            Self::Rejection => "rejection",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "approval" => Ok(Self::Approval),
            "rejection" => Ok(Self::Rejection),
            other => Err(format!("unknown email template: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub id: TemplateKind,
    pub name: String,
    pub subject: String,
    pub content: String,
}

impl EmailTemplate {
    pub fn default_for(kind: TemplateKind) -> Self {
        match kind {
            TemplateKind::Approval => Self {
                id: kind,
                name: "Approval Template".to_string(),
                subject: "Your registration has been approved!".to_string(),
                content: APPROVAL_CONTENT.to_string(),
            },
            TemplateKind::Rejection => Self {
                id: kind,
                name: "Rejection Template".to_string(),
                subject: "Update on your registration".to_string(),
                content: REJECTION_CONTENT.to_string(),
            },
        }
    }

    pub fn defaults() -> Vec<Self> {
        TemplateKind::ALL.into_iter().map(Self::default_for).collect()
    }

    pub fn render(&self, data: &PreviewData) -> RenderedEmail {
        RenderedEmail {
            subject: data.substitute(&self.subject),
            body: data.substitute(&self.content),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

/// Values for `{{placeholder}}` substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewData(BTreeMap<String, String>);

impl PreviewData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Data shown in the editor preview.
    pub fn sample() -> Self {
        Self::new()
            .with("name", "John Doe")
            .with("event", "Tech Conference 2024")
            .with("eventDate", "March 15, 2024")
            .with("eventLocation", "San Francisco, CA")
    }

    pub fn for_participant(participant: &Participant) -> Self {
        Self::new()
            .with("name", participant.display_name())
            .with("event", participant.event.as_str())
            .with(
                "eventDate",
                participant.event_date.clone().unwrap_or_default(),
            )
            .with(
                "eventLocation",
                participant.event_location.clone().unwrap_or_default(),
            )
    }

    /// Replaces every `{{key}}` (whitespace inside the braces allowed) with
    /// its value. Unknown keys and unterminated braces are copied verbatim.
    pub fn substitute(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];
            let Some(end) = after_open.find("}}") else {
                out.push_str(&rest[start..]);
                return out;
            };
            let key = after_open[..end].trim();
            match self.get(key) {
                Some(value) => out.push_str(value),
                None => out.push_str(&rest[start..start + 2 + end + 2]),
            }
            rest = &after_open[end + 2..];
        }

        out.push_str(rest);
        out
    }
}

const APPROVAL_CONTENT: &str = r#"<!DOCTYPE html>
<html>
<head>
  <style>
    body { font-family: Arial, sans-serif; line-height: 1.6; }
    .container { max-width: 600px; margin: 0 auto; padding: 20px; }
    .header { background: #4F46E5; color: white; padding: 20px; text-align: center; }
    .content { padding: 20px; background: #f9fafb; }
    .footer { text-align: center; padding: 20px; color: #6B7280; }
  </style>
</head>
<body>
  <div class="container">
    <div class="header">
      <h1>Registration Approved!</h1>
    </div>
    <div class="content">
      <p>Dear {{name}},</p>
      <p>We're excited to inform you that your registration for {{event}} has been approved!</p>
      <p>Event Details:</p>
      <ul>
        <li>Event: {{event}}</li>
        <li>Date: {{eventDate}}</li>
        <li>Location: {{eventLocation}}</li>
      </ul>
      <p>We look forward to seeing you at the event!</p>
    </div>
    <div class="footer">
      <p>This is an automated message, please do not reply.</p>
    </div>
  </div>
</body>
</html>"#;

const REJECTION_CONTENT: &str = r#"<!DOCTYPE html>
<html>
<head>
  <style>
    body { font-family: Arial, sans-serif; line-height: 1.6; }
    .container { max-width: 600px; margin: 0 auto; padding: 20px; }
    .header { background: #DC2626; color: white; padding: 20px; text-align: center; }
    .content { padding: 20px; background: #f9fafb; }
    .footer { text-align: center; padding: 20px; color: #6B7280; }
  </style>
</head>
<body>
  <div class="container">
    <div class="header">
      <h1>Registration Status Update</h1>
    </div>
    <div class="content">
      <p>Dear {{name}},</p>
      <p>Thank you for your interest in {{event}}. After careful review, we regret to inform you that we are unable to approve your registration at this time.</p>
      <p>Reasons may include:</p>
      <ul>
        <li>Limited capacity</li>
        <li>Eligibility criteria not met</li>
        <li>Incomplete information</li>
      </ul>
      <p>We encourage you to apply for our future events.</p>
    </div>
    <div class="footer">
      <p>This is an automated message, please do not reply.</p>
    </div>
  </div>
</body>
</html>"#;
