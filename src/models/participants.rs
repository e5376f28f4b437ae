use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    Pending,
    Approved,
    Rejected,
}

impl ParticipantStatus {
    pub const ALL: [ParticipantStatus; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Statuses an admin may move a participant to from this one.
    pub fn transitions(&self) -> &'static [ParticipantStatus] {
        match self {
            Self::Pending => &[Self::Approved, Self::Rejected],
            Self::Approved => &[Self::Rejected],
            Self::Rejected => &[Self::Approved],
        }
    }

    pub fn can_become(&self, next: ParticipantStatus) -> bool {
        self.transitions().contains(&next)
    }

    /// Verb used in prompts ("approve", "reject").
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Pending => "reset",
            Self::Approved => "approve",
            Self::Rejected => "reject",
        }
    }
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown participant status: {other}")),
        }
    }
}

// Registration row as served by `GET /participants`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    #[serde(rename = "name", deserialize_with = "one_or_many")]
    pub names: Vec<String>,
    pub email: String,
    #[serde(rename = "phone", default, deserialize_with = "one_or_many")]
    pub phones: Vec<String>,
    #[serde(default)]
    pub event: String,
    #[serde(default, alias = "eventDate")]
    pub event_date: Option<String>,
    #[serde(default, alias = "eventLocation")]
    pub event_location: Option<String>,
    #[serde(default)]
    pub amount_paid: f64,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub transaction_screenshot: Option<String>,
    pub status: ParticipantStatus,
    #[serde(default)]
    pub created_at: String,
}

impl Participant {
    /// First registered name, used as the salutation in emails.
    pub fn display_name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or("")
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
    Missing(()),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::Missing(()) => Vec::new(),
    };
    Ok(values
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}
