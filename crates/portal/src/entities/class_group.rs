//! Class group entity

use ecole_database::{Record, Table};
use serde::{Deserialize, Serialize};

/// A class of students, owned by at most one responsible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
}

impl Record for ClassGroup {
    const TABLE: Table = Table::Classes;

    fn id(&self) -> &str {
        &self.id
    }
}
