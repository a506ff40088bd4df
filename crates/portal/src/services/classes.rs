//! Class administration. Remote-confirmed, administrators only.

use crate::entities::{ClassGroup, NotificationType, Page, Severity};
use crate::portal::Portal;
use crate::types::{ClassUpdate, NewClass, PortalError, PortalResult};
use crate::utils::new_id;
use crate::utils::validation::normalize_email;

impl Portal {
    pub async fn create_class(&self, request: NewClass) -> PortalResult<ClassGroup> {
        let result = self.try_create_class(request).await;
        self.report(result, Some(Page::Admin)).await
    }

    async fn try_create_class(&self, request: NewClass) -> PortalResult<ClassGroup> {
        let admin = self.require_admin().await?;
        request.validate()?;

        let class = ClassGroup {
            id: new_id(),
            name: request.name.trim().to_string(),
            description: request.description.filter(|d| !d.trim().is_empty()),
            contact_email: request
                .contact_email
                .filter(|e| !e.trim().is_empty())
                .map(|e| normalize_email(&e)),
        };
        let class = self.confirmed_insert(class).await?;

        self.notify(
            format!("Classe {} créée", class.name),
            NotificationType::Success,
            Some(Page::Admin),
        )
        .await;
        self.audit(
            &admin,
            "Création de classe",
            format!("Classe {} ({})", class.name, class.id),
            Severity::Info,
        )
        .await;
        Ok(class)
    }

    pub async fn update_class(&self, id: &str, patch: ClassUpdate) -> PortalResult<ClassGroup> {
        let result = self.try_update_class(id, patch).await;
        self.report(result, Some(Page::Admin)).await
    }

    async fn try_update_class(&self, id: &str, mut patch: ClassUpdate) -> PortalResult<ClassGroup> {
        let admin = self.require_admin().await?;
        patch.validate()?;
        if self.get::<ClassGroup>(id).await.is_none() {
            return Err(PortalError::not_found("Classe", id));
        }
        patch.name = patch.name.map(|name| name.trim().to_string());
        patch.contact_email = patch.contact_email.map(|email| normalize_email(&email));

        let class: ClassGroup = self.confirmed_update(id, &patch).await?;

        self.notify(
            format!("Classe {} mise à jour", class.name),
            NotificationType::Success,
            Some(Page::Admin),
        )
        .await;
        self.audit(
            &admin,
            "Modification de classe",
            format!("Classe {} ({})", class.name, class.id),
            Severity::Info,
        )
        .await;
        Ok(class)
    }

    pub async fn delete_class(&self, id: &str) -> PortalResult<()> {
        let result = self.try_delete_class(id).await;
        self.report(result, Some(Page::Admin)).await
    }

    async fn try_delete_class(&self, id: &str) -> PortalResult<()> {
        let admin = self.require_admin().await?;
        let class = self
            .get::<ClassGroup>(id)
            .await
            .ok_or_else(|| PortalError::not_found("Classe", id))?;

        self.confirmed_delete::<ClassGroup>(id).await?;

        self.notify(
            format!("Classe {} supprimée", class.name),
            NotificationType::Success,
            Some(Page::Admin),
        )
        .await;
        self.audit(
            &admin,
            "Suppression de classe",
            format!("Classe {} ({})", class.name, class.id),
            Severity::Critical,
        )
        .await;
        Ok(())
    }
}
