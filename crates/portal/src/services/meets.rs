//! Video session links.

use crate::entities::{ClassScoped, Meet, NotificationType, Page};
use crate::portal::Portal;
use crate::types::{MeetUpdate, NewMeet, PortalResult};
use crate::utils::new_id;

const PAGE: Page = Meet::PAGE;

impl Portal {
    pub async fn schedule_meet(&self, request: NewMeet) -> PortalResult<Meet> {
        let result = self.try_schedule_meet(request).await;
        self.report(result, Some(PAGE)).await
    }

    async fn try_schedule_meet(&self, request: NewMeet) -> PortalResult<Meet> {
        let author = self.require_publisher().await?;
        request.validate()?;
        let class_id = self.target_class(&author, request.class_id.as_deref()).await?;

        let meet = Meet {
            id: new_id(),
            subject: request.subject.trim().to_string(),
            teacher_name: request.teacher_name.trim().to_string(),
            link: request.link.trim().to_string(),
            date: request.date,
            class_id,
        };
        let meet = self.create_content(meet).await?;

        self.notify(
            format!("Visio {} programmée", meet.subject),
            NotificationType::Success,
            Some(PAGE),
        )
        .await;
        Ok(meet)
    }

    pub async fn update_meet(&self, id: &str, patch: MeetUpdate) -> PortalResult<Meet> {
        let result = self.try_update_meet(id, patch).await;
        self.report(result, Some(PAGE)).await
    }

    async fn try_update_meet(&self, id: &str, mut patch: MeetUpdate) -> PortalResult<Meet> {
        let author = self.require_publisher().await?;
        patch.validate()?;
        patch.link = patch.link.map(|link| link.trim().to_string());

        let meet: Meet = self.update_content(&author, id, &patch).await?;

        self.notify("Visio modifiée", NotificationType::Success, Some(PAGE))
            .await;
        Ok(meet)
    }

    pub async fn delete_meet(&self, id: &str) -> PortalResult<()> {
        let result = self.try_delete_meet(id).await;
        self.report(result, Some(PAGE)).await
    }

    async fn try_delete_meet(&self, id: &str) -> PortalResult<()> {
        let author = self.require_publisher().await?;
        let _: Meet = self.delete_content(&author, id).await?;

        self.notify("Visio supprimée", NotificationType::Success, Some(PAGE))
            .await;
        Ok(())
    }
}
