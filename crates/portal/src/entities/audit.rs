//! Audit log entity

use chrono::{DateTime, Utc};
use ecole_database::{Record, Table};
use serde::{Deserialize, Serialize};

use super::user::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Append-only audit record. Author name and role are snapshots taken when
/// the entry is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: String,
    pub action: String,
    pub details: String,
    pub author: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
}

impl Record for AuditLogEntry {
    const TABLE: Table = Table::AuditLogs;

    fn id(&self) -> &str {
        &self.id
    }
}
