//! Transient toast queue

use chrono::{DateTime, Duration, Utc};

use crate::entities::Notification;

/// Toasts auto-expire `ttl` after their timestamp or when dismissed.
#[derive(Debug, Clone)]
pub struct ToastQueue {
    ttl: Duration,
    toasts: Vec<Notification>,
}

impl ToastQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            toasts: Vec::new(),
        }
    }

    pub fn push(&mut self, notification: Notification) {
        self.toasts.push(notification);
    }

    fn is_live(&self, toast: &Notification, now: DateTime<Utc>) -> bool {
        now - toast.timestamp < self.ttl
    }

    /// Toasts still on screen at `now`, oldest first.
    pub fn visible(&self, now: DateTime<Utc>) -> Vec<Notification> {
        self.toasts
            .iter()
            .filter(|toast| self.is_live(toast, now))
            .cloned()
            .collect()
    }

    /// Remove a toast before it expires. Returns whether it was showing.
    pub fn dismiss(&mut self, id: &str) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.id != id);
        self.toasts.len() != before
    }

    /// Drop expired toasts.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.toasts.retain(|toast| now - toast.timestamp < ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::NotificationType;
    use chrono::TimeZone;

    fn toast(id: &str, at: DateTime<Utc>) -> Notification {
        Notification {
            id: id.into(),
            message: "Examen enregistré".into(),
            notification_type: NotificationType::Success,
            timestamp: at,
            target_page: None,
            read: false,
        }
    }

    #[test]
    fn toast_expires_after_ttl() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
        let mut queue = ToastQueue::new(Duration::milliseconds(5000));
        queue.push(toast("n1", t0));

        assert_eq!(queue.visible(t0 + Duration::milliseconds(4999)).len(), 1);
        assert!(queue.visible(t0 + Duration::milliseconds(5000)).is_empty());
        assert!(queue.visible(t0 + Duration::milliseconds(5001)).is_empty());

        queue.prune(t0 + Duration::milliseconds(5001));
        assert!(!queue.dismiss("n1"));
    }

    #[test]
    fn dismiss_removes_only_that_toast() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
        let mut queue = ToastQueue::new(Duration::milliseconds(5000));
        queue.push(toast("n1", t0));
        queue.push(toast("n2", t0));

        assert!(queue.dismiss("n1"));
        let visible = queue.visible(t0);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "n2");
    }
}
