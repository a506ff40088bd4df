//! Announcement entity

use chrono::{DateTime, Utc};
use ecole_database::{Record, Table};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    Info,
    #[default]
    Normal,
    Urgent,
}

/// Class-scoped announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub content: String,
    pub date: DateTime<Utc>,
    pub urgency: Urgency,
    pub author_id: String,
    pub class_id: String,
}

impl Record for Announcement {
    const TABLE: Table = Table::Announcements;

    fn id(&self) -> &str {
        &self.id
    }
}
