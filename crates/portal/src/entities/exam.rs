//! Exam session entity

use chrono::{DateTime, Utc};
use ecole_database::{Record, Table};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: String,
    pub subject: String,
    pub date: DateTime<Utc>,
    pub duration_minutes: u32,
    pub room: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub author_id: String,
    pub class_id: String,
}

impl Record for Exam {
    const TABLE: Table = Table::Exams;

    fn id(&self) -> &str {
        &self.id
    }
}
