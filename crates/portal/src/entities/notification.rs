//! Notification entity definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationType {
    Success,
    Error,
    Info,
    Warning,
}

/// Portal page a notification links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Dashboard,
    Announcements,
    Exams,
    Meets,
    Polls,
    Timetable,
    Assistant,
    Admin,
}

/// A user-facing notification. The same value lives in the toast queue and
/// in the session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub target_page: Option<Page>,
    #[serde(default)]
    pub read: bool,
}
