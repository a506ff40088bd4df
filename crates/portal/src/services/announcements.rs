//! Class announcements.

use crate::entities::{Announcement, ClassScoped, NotificationType, Page, Severity};
use crate::portal::Portal;
use crate::types::{AnnouncementUpdate, NewAnnouncement, PortalResult};
use crate::utils::new_id;

const PAGE: Page = Announcement::PAGE;

impl Portal {
    pub async fn publish_announcement(&self, request: NewAnnouncement) -> PortalResult<Announcement> {
        let result = self.try_publish_announcement(request).await;
        self.report(result, Some(PAGE)).await
    }

    async fn try_publish_announcement(&self, request: NewAnnouncement) -> PortalResult<Announcement> {
        let author = self.require_publisher().await?;
        request.validate()?;
        let class_id = self.target_class(&author, request.class_id.as_deref()).await?;

        let announcement = Announcement {
            id: new_id(),
            title: request.title.trim().to_string(),
            content: request.content.trim().to_string(),
            date: self.now(),
            urgency: request.urgency,
            author_id: author.id.clone(),
            class_id,
        };
        let announcement = self.create_content(announcement).await?;

        self.notify("Annonce publiée", NotificationType::Success, Some(PAGE))
            .await;
        self.audit(
            &author,
            "Publication d'annonce",
            format!("Annonce {} : {}", announcement.id, announcement.title),
            Severity::Info,
        )
        .await;
        Ok(announcement)
    }

    pub async fn update_announcement(
        &self,
        id: &str,
        patch: AnnouncementUpdate,
    ) -> PortalResult<Announcement> {
        let result = self.try_update_announcement(id, patch).await;
        self.report(result, Some(PAGE)).await
    }

    async fn try_update_announcement(
        &self,
        id: &str,
        mut patch: AnnouncementUpdate,
    ) -> PortalResult<Announcement> {
        let author = self.require_publisher().await?;
        patch.validate()?;
        patch.title = patch.title.map(|title| title.trim().to_string());
        patch.content = patch.content.map(|content| content.trim().to_string());

        let announcement: Announcement = self.update_content(&author, id, &patch).await?;

        self.notify("Annonce modifiée", NotificationType::Success, Some(PAGE))
            .await;
        self.audit(
            &author,
            "Modification d'annonce",
            format!("Annonce {} : {}", announcement.id, announcement.title),
            Severity::Info,
        )
        .await;
        Ok(announcement)
    }

    pub async fn delete_announcement(&self, id: &str) -> PortalResult<()> {
        let result = self.try_delete_announcement(id).await;
        self.report(result, Some(PAGE)).await
    }

    async fn try_delete_announcement(&self, id: &str) -> PortalResult<()> {
        let author = self.require_publisher().await?;
        let removed: Announcement = self.delete_content(&author, id).await?;

        self.notify("Annonce supprimée", NotificationType::Success, Some(PAGE))
            .await;
        self.audit(
            &author,
            "Suppression d'annonce",
            format!("Annonce {} : {}", removed.id, removed.title),
            Severity::Warning,
        )
        .await;
        Ok(())
    }
}
