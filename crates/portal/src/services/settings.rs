//! School-wide settings.

use ecole_database::{codec, Record};
use tracing::info;

use crate::entities::{AppSetting, NotificationType, Page, Severity, SCHOOL_NAME_KEY};
use crate::portal::Portal;
use crate::types::PortalResult;
use crate::utils::validation::require;

impl Portal {
    /// Rename the school. Remote-confirmed upsert of the `school_name` key.
    pub async fn set_school_name(&self, name: &str) -> PortalResult<String> {
        let result = self.try_set_school_name(name).await;
        self.report(result, Some(Page::Admin)).await
    }

    async fn try_set_school_name(&self, name: &str) -> PortalResult<String> {
        let admin = self.require_admin().await?;
        require(name, "Le nom de l'établissement est requis")?;
        let name = name.trim().to_string();

        let setting = AppSetting {
            id: SCHOOL_NAME_KEY.to_string(),
            key: SCHOOL_NAME_KEY.to_string(),
            value: name.clone(),
        };
        let stored = self
            .store
            .upsert(AppSetting::TABLE, "key", codec::encode(&setting)?)
            .await?;
        let stored: AppSetting = codec::decode(stored)?;

        let previous = {
            let mut state = self.state.write().await;
            std::mem::replace(&mut state.school_name, stored.value.clone())
        };
        self.after_write().await;

        info!(from = %previous, to = %stored.value, "school renamed");
        self.notify(
            "Nom de l'établissement mis à jour",
            NotificationType::Success,
            Some(Page::Admin),
        )
        .await;
        self.audit(
            &admin,
            "Changement du nom de l'établissement",
            format!("{previous} -> {}", stored.value),
            Severity::Warning,
        )
        .await;
        Ok(stored.value)
    }
}
