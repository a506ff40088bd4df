//! Toast and history views for the presentation layer.

use crate::entities::{Notification, Page};
use crate::portal::Portal;

impl Portal {
    /// Toasts still on screen at the current clock time.
    pub async fn toasts(&self) -> Vec<Notification> {
        let now = self.now();
        let mut state = self.state.write().await;
        state.notifier.toasts.prune(now);
        state.notifier.toasts.visible(now)
    }

    pub async fn dismiss_toast(&self, id: &str) -> bool {
        self.state.write().await.notifier.toasts.dismiss(id)
    }

    /// Session history, newest first.
    pub async fn history(&self) -> Vec<Notification> {
        self.state.read().await.notifier.history.entries().to_vec()
    }

    pub async fn unread_count(&self) -> usize {
        self.state.read().await.notifier.history.unread_count()
    }

    pub async fn mark_read(&self, id: &str) -> bool {
        self.state.write().await.notifier.history.mark_read(id)
    }

    pub async fn mark_all_read(&self) {
        self.state.write().await.notifier.history.mark_all_read();
    }

    /// Mark a history entry read and return the page it links to.
    pub async fn open_notification(&self, id: &str) -> Option<Page> {
        self.state.write().await.notifier.history.open(id)
    }

    pub async fn delete_notification(&self, id: &str) -> bool {
        self.state.write().await.notifier.history.delete(id)
    }

    pub async fn clear_notifications(&self) {
        self.state.write().await.notifier.history.clear();
    }
}
