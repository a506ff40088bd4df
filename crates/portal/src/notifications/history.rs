//! Session notification history

use crate::entities::{Notification, Page};

/// Newest-first list of every notification raised this session.
#[derive(Debug, Clone, Default)]
pub struct NotificationHistory {
    entries: Vec<Notification>,
}

impl NotificationHistory {
    pub fn record(&mut self, notification: Notification) {
        self.entries.insert(0, notification);
    }

    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.read).count()
    }

    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for entry in &mut self.entries {
            entry.read = true;
        }
    }

    /// Click-through: mark read and return the linked page.
    pub fn open(&mut self, id: &str) -> Option<Page> {
        let entry = self.entries.iter_mut().find(|entry| entry.id == id)?;
        entry.read = true;
        entry.target_page
    }

    /// Delete one entry. Unknown ids are ignored.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::NotificationType;
    use chrono::Utc;

    fn entry(id: &str, page: Option<Page>) -> Notification {
        Notification {
            id: id.into(),
            message: format!("notification {id}"),
            notification_type: NotificationType::Info,
            timestamp: Utc::now(),
            target_page: page,
            read: false,
        }
    }

    #[test]
    fn read_state_transitions() {
        let mut history = NotificationHistory::default();
        history.record(entry("n1", None));
        history.record(entry("n2", Some(Page::Polls)));
        history.record(entry("n3", None));
        assert_eq!(history.unread_count(), 3);
        assert_eq!(history.entries()[0].id, "n3");

        assert!(history.mark_read("n1"));
        assert_eq!(history.unread_count(), 2);

        assert_eq!(history.open("n2"), Some(Page::Polls));
        assert_eq!(history.unread_count(), 1);

        history.mark_all_read();
        assert_eq!(history.unread_count(), 0);
    }

    #[test]
    fn delete_and_clear() {
        let mut history = NotificationHistory::default();
        history.record(entry("n1", None));
        history.record(entry("n2", None));

        assert!(history.delete("n1"));
        assert!(!history.delete("n1"));
        assert_eq!(history.entries().len(), 1);

        history.clear();
        assert!(history.entries().is_empty());
        assert!(!history.mark_read("n2"));
    }
}
