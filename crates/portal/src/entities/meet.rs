//! Video session entity

use chrono::{DateTime, Utc};
use ecole_database::{Record, Table};
use serde::{Deserialize, Serialize};

/// A scheduled video session link for a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meet {
    pub id: String,
    pub subject: String,
    pub teacher_name: String,
    pub link: String,
    pub date: DateTime<Utc>,
    pub class_id: String,
}

impl Record for Meet {
    const TABLE: Table = Table::Meets;

    fn id(&self) -> &str {
        &self.id
    }
}
