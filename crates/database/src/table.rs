//! Remote table catalogue.

use serde::{Deserialize, Serialize};

/// Every table the portal reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Classes,
    Users,
    Announcements,
    Exams,
    Meets,
    Polls,
    AuditLogs,
    SentEmails,
    AppSettings,
    AiConversations,
}

impl Table {
    pub const ALL: [Table; 10] = [
        Table::Classes,
        Table::Users,
        Table::Announcements,
        Table::Exams,
        Table::Meets,
        Table::Polls,
        Table::AuditLogs,
        Table::SentEmails,
        Table::AppSettings,
        Table::AiConversations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Classes => "classes",
            Table::Users => "users",
            Table::Announcements => "announcements",
            Table::Exams => "exams",
            Table::Meets => "meets",
            Table::Polls => "polls",
            Table::AuditLogs => "audit_logs",
            Table::SentEmails => "sent_emails",
            Table::AppSettings => "app_settings",
            Table::AiConversations => "ai_conversations",
        }
    }

    /// Columns whose values must be unique across the table.
    pub fn unique_columns(&self) -> &'static [&'static str] {
        match self {
            Table::Users => &["email"],
            Table::AppSettings => &["key"],
            Table::AiConversations => &["user_id"],
            _ => &[],
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .iter()
            .copied()
            .find(|table| table.as_str() == s)
            .ok_or_else(|| format!("unknown table: {s}"))
    }
}
