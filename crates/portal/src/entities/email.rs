//! Sent e-mail record

use chrono::{DateTime, Utc};
use ecole_database::{Record, Table};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceType {
    Announcement,
    Meet,
    Exam,
    Poll,
}

impl ResourceType {
    pub fn label(&self) -> &'static str {
        match self {
            ResourceType::Announcement => "Annonce",
            ResourceType::Meet => "Visio",
            ResourceType::Exam => "Examen",
            ResourceType::Poll => "Sondage",
        }
    }
}

/// Snapshot of a share action, stored whether or not delivery succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentEmailRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub recipient_email: Option<String>,
    pub subject: String,
    pub body: String,
    pub resource_type: ResourceType,
    pub sender_name: String,
    pub class_id: String,
}

impl Record for SentEmailRecord {
    const TABLE: Table = Table::SentEmails;

    fn id(&self) -> &str {
        &self.id
    }
}
