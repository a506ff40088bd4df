//! Key/value application settings

use ecole_database::{Record, Table};
use serde::{Deserialize, Serialize};

pub const SCHOOL_NAME_KEY: &str = "school_name";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSetting {
    pub id: String,
    pub key: String,
    pub value: String,
}

impl Record for AppSetting {
    const TABLE: Table = Table::AppSettings;

    fn id(&self) -> &str {
        &self.id
    }
}
