//! Toasts, notification history and the audit trail.

pub mod audit;
pub mod history;
pub mod toast;

pub use audit::AuditTrail;
pub use history::NotificationHistory;
pub use toast::ToastQueue;

use chrono::{DateTime, Duration, Utc};

use crate::entities::{Notification, NotificationType, Page};
use crate::utils::new_id;

/// Raises notifications into both the toast queue and the history.
///
/// The two lifecycles are independent: dismissing a toast leaves the history
/// entry alone and deleting a history entry never touches the toast.
#[derive(Debug, Clone)]
pub struct Notifier {
    pub toasts: ToastQueue,
    pub history: NotificationHistory,
}

impl Notifier {
    pub fn new(toast_ttl: Duration) -> Self {
        Self {
            toasts: ToastQueue::new(toast_ttl),
            history: NotificationHistory::default(),
        }
    }

    pub fn notify(
        &mut self,
        message: impl Into<String>,
        notification_type: NotificationType,
        target_page: Option<Page>,
        now: DateTime<Utc>,
    ) -> Notification {
        let notification = Notification {
            id: new_id(),
            message: message.into(),
            notification_type,
            timestamp: now,
            target_page,
            read: false,
        };

        self.toasts.prune(now);
        self.toasts.push(notification.clone());
        self.history.record(notification.clone());
        notification
    }
}
