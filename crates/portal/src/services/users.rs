//! User administration and CSV import. Remote-confirmed, administrators only.

use serde_json::Value;
use tracing::{info, warn};

use crate::entities::{ClassGroup, NotificationType, Page, Role, Severity, User};
use crate::portal::{non_empty_patch, Portal};
use crate::types::{ImportReport, NewUser, PortalError, PortalResult, UserUpdate};
use crate::utils::csv::parse_user_rows;
use crate::utils::new_id;
use crate::utils::validation::normalize_email;

impl Portal {
    pub async fn create_user(&self, request: NewUser) -> PortalResult<User> {
        let result = self.try_create_user(request).await;
        self.report(result, Some(Page::Admin)).await
    }

    async fn try_create_user(&self, request: NewUser) -> PortalResult<User> {
        let admin = self.require_admin().await?;
        let user = self.insert_user(request).await?;

        self.notify(
            format!("Utilisateur {} créé", user.name),
            NotificationType::Success,
            Some(Page::Admin),
        )
        .await;
        self.audit(
            &admin,
            "Création d'utilisateur",
            format!("{} <{}> ({})", user.name, user.email, user.role),
            Severity::Info,
        )
        .await;
        Ok(user)
    }

    /// Validate and insert one user without notifying.
    async fn insert_user(&self, request: NewUser) -> PortalResult<User> {
        request.validate()?;
        let class_id = match request.role {
            Role::Admin => None,
            _ => request.class_id.filter(|id| !id.trim().is_empty()),
        };
        if let Some(class_id) = &class_id {
            if self.get::<ClassGroup>(class_id).await.is_none() {
                return Err(PortalError::not_found("Classe", class_id.clone()));
            }
        }

        let user = User {
            id: new_id(),
            name: request.name.trim().to_string(),
            role: request.role,
            email: normalize_email(&request.email),
            class_id,
            avatar: request.avatar,
        };
        self.confirmed_insert(user).await
    }

    pub async fn update_user(&self, id: &str, patch: UserUpdate) -> PortalResult<User> {
        let result = self.try_update_user(id, patch).await;
        self.report(result, Some(Page::Admin)).await
    }

    async fn try_update_user(&self, id: &str, mut patch: UserUpdate) -> PortalResult<User> {
        let admin = self.require_admin().await?;
        patch.validate()?;
        let current = self
            .get::<User>(id)
            .await
            .ok_or_else(|| PortalError::not_found("Utilisateur", id))?;
        patch.name = patch.name.map(|name| name.trim().to_string());
        patch.email = patch.email.map(|email| normalize_email(&email));

        let role = patch.role.unwrap_or(current.role);
        if let Some(class_id) = &patch.class_id {
            if role == Role::Admin {
                return Err(PortalError::validation(
                    "Un administrateur n'est rattaché à aucune classe",
                ));
            }
            if self.get::<ClassGroup>(class_id).await.is_none() {
                return Err(PortalError::not_found("Classe", class_id.clone()));
            }
        }

        let mut row = non_empty_patch(&patch)?;
        if role == Role::Admin && current.class_id.is_some() {
            row.insert("classId".to_string(), Value::Null);
        }
        let user: User = self.confirmed_update(id, &row).await?;

        // The signed-in account may have been edited.
        {
            let mut state = self.state.write().await;
            if state.current_user.as_ref().map(|u| u.id.as_str()) == Some(user.id.as_str()) {
                state.current_user = Some(user.clone());
            }
        }

        self.notify(
            format!("Utilisateur {} mis à jour", user.name),
            NotificationType::Success,
            Some(Page::Admin),
        )
        .await;
        self.audit(
            &admin,
            "Modification d'utilisateur",
            format!("{} <{}> ({})", user.name, user.email, user.role),
            Severity::Info,
        )
        .await;
        Ok(user)
    }

    pub async fn delete_user(&self, id: &str) -> PortalResult<()> {
        let result = self.try_delete_user(id).await;
        self.report(result, Some(Page::Admin)).await
    }

    async fn try_delete_user(&self, id: &str) -> PortalResult<()> {
        let admin = self.require_admin().await?;
        if admin.id == id {
            return Err(PortalError::validation(
                "Vous ne pouvez pas supprimer votre propre compte",
            ));
        }
        let user = self
            .get::<User>(id)
            .await
            .ok_or_else(|| PortalError::not_found("Utilisateur", id))?;

        self.confirmed_delete::<User>(id).await?;

        self.notify(
            format!("Utilisateur {} supprimé", user.name),
            NotificationType::Success,
            Some(Page::Admin),
        )
        .await;
        self.audit(
            &admin,
            "Suppression d'utilisateur",
            format!("{} <{}> ({})", user.name, user.email, user.id),
            Severity::Critical,
        )
        .await;
        Ok(())
    }

    /// Import `name,email,role,class` lines. Rows the store refuses count as
    /// skipped; a single notification summarises the run.
    pub async fn import_users_csv(&self, payload: &str) -> PortalResult<ImportReport> {
        let result = self.try_import_users_csv(payload).await;
        self.report(result, Some(Page::Admin)).await
    }

    async fn try_import_users_csv(&self, payload: &str) -> PortalResult<ImportReport> {
        let admin = self.require_admin().await?;
        let classes = self.all::<ClassGroup>().await;
        let parsed = parse_user_rows(payload, &classes);

        let mut report = ImportReport {
            imported: 0,
            skipped: parsed.skipped,
        };
        for row in parsed.rows {
            let email = row.email.clone();
            match self.insert_user(row).await {
                Ok(_) => report.imported += 1,
                Err(err) => {
                    warn!(%email, error = %err, "import row rejected");
                    report.skipped += 1;
                }
            }
        }

        info!(imported = report.imported, skipped = report.skipped, "user import finished");
        let notification_type = if report.imported > 0 {
            NotificationType::Success
        } else {
            NotificationType::Warning
        };
        self.notify(
            format!(
                "Import terminé : {} ajouté(s), {} ignoré(s)",
                report.imported, report.skipped
            ),
            notification_type,
            Some(Page::Admin),
        )
        .await;
        if report.imported > 0 {
            self.audit(
                &admin,
                "Import d'utilisateurs",
                format!("{} ajouté(s), {} ignoré(s)", report.imported, report.skipped),
                Severity::Info,
            )
            .await;
        }
        Ok(report)
    }
}
