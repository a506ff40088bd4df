//! Sign-in, user switching and collection loading.

use ecole_database::{codec, Filter, Record};
use tracing::{error, info, warn};

use crate::entities::{
    AiConversation, Announcement, AppSetting, AuditLogEntry, ClassGroup, Exam, Meet,
    NotificationType, Page, Poll, SentEmailRecord, User, SCHOOL_NAME_KEY,
};
use crate::portal::Portal;
use crate::types::{PortalError, PortalResult};
use crate::utils::validation::{normalize_email, require};

impl Portal {
    /// Sign in by e-mail address. No password is involved.
    pub async fn sign_in(&self, email: &str) -> PortalResult<User> {
        let result = self.try_sign_in(email).await;
        self.report(result, Some(Page::Dashboard)).await
    }

    async fn try_sign_in(&self, email: &str) -> PortalResult<User> {
        require(email, "L'e-mail est requis")?;
        let email = normalize_email(email);

        let user = self
            .identity
            .resolve_email(&email)
            .await?
            .ok_or_else(|| PortalError::validation(format!("Aucun compte pour {email}")))?;

        self.start_session(user.clone()).await;
        info!(user = %user.id, role = %user.role, "signed in");
        self.notify(
            format!("Bienvenue, {}", user.name),
            NotificationType::Success,
            Some(Page::Dashboard),
        )
        .await;
        Ok(user)
    }

    /// Switch the session to another existing account and reload.
    pub async fn switch_user(&self, user_id: &str) -> PortalResult<User> {
        let result = self.try_switch_user(user_id).await;
        self.report(result, Some(Page::Dashboard)).await
    }

    async fn try_switch_user(&self, user_id: &str) -> PortalResult<User> {
        let rows = self
            .store
            .select_where(User::TABLE, &Filter::eq("id", user_id))
            .await?;
        let user: User = match rows.into_iter().next() {
            Some(row) => codec::decode(row)?,
            None => return Err(PortalError::not_found("Utilisateur", user_id)),
        };

        self.start_session(user.clone()).await;
        info!(user = %user.id, role = %user.role, "switched user");
        self.notify(
            format!("Connecté en tant que {}", user.name),
            NotificationType::Info,
            Some(Page::Dashboard),
        )
        .await;
        Ok(user)
    }

    /// Pending operations belong to the previous session and are dropped
    /// before the new user's collections load.
    async fn start_session(&self, user: User) {
        let dropped = {
            let mut state = self.state.write().await;
            let dropped = state.pending.failed_count();
            state.pending.clear();
            state.current_user = Some(user);
            state.conversation = None;
            dropped
        };
        if dropped > 0 {
            warn!(dropped, "unsynchronised changes of the previous session discarded");
        }
        self.refresh().await;
    }

    /// End the session and drop every mirrored collection.
    pub async fn sign_out(&self) {
        let dropped = {
            let mut state = self.state.write().await;
            let Some(user) = state.current_user.take() else {
                return;
            };
            info!(user = %user.id, "signed out");

            let dropped = state.pending.failed_count();
            state.pending.clear();
            state.domain = Default::default();
            state.conversation = None;
            state.school_name = self.default_school_name.clone();
            dropped
        };

        if dropped > 0 {
            warn!(dropped, "unsynchronised changes discarded at sign-out");
        }
        self.notify("Vous êtes déconnecté", NotificationType::Info, None)
            .await;
    }

    /// Reload every collection. Each one loads independently; returns how
    /// many failed.
    pub async fn refresh(&self) -> usize {
        let loaded = [
            self.load::<ClassGroup>().await,
            self.load::<User>().await,
            self.load::<Announcement>().await,
            self.load::<Exam>().await,
            self.load::<Meet>().await,
            self.load::<Poll>().await,
            self.load::<AuditLogEntry>().await,
            self.load::<SentEmailRecord>().await,
            self.load_school_name().await,
            self.load_conversation().await,
        ];
        let failed = loaded.iter().filter(|ok| !**ok).count();
        if failed > 0 {
            warn!(failed, "some collections could not be loaded");
        }
        failed
    }

    async fn load_school_name(&self) -> bool {
        let rows = match self
            .store
            .select_where(AppSetting::TABLE, &Filter::eq("key", SCHOOL_NAME_KEY))
            .await
        {
            Ok(rows) => rows,
            Err(err) => {
                error!(error = %err, "failed to load school name");
                return false;
            }
        };

        let Some(row) = rows.into_iter().next() else {
            return true;
        };
        match codec::decode::<AppSetting>(row) {
            Ok(setting) => {
                self.state.write().await.school_name = setting.value;
                true
            }
            Err(err) => {
                error!(error = %err, "failed to decode school name");
                false
            }
        }
    }

    async fn load_conversation(&self) -> bool {
        let Some(user) = self.current_user().await else {
            return true;
        };
        let rows = match self
            .store
            .select_where(AiConversation::TABLE, &Filter::eq("user_id", user.id.as_str()))
            .await
        {
            Ok(rows) => rows,
            Err(err) => {
                error!(error = %err, "failed to load assistant conversation");
                return false;
            }
        };

        let conversation = match rows.into_iter().next().map(codec::decode::<AiConversation>) {
            None => None,
            Some(Ok(conversation)) => Some(conversation),
            Some(Err(err)) => {
                error!(error = %err, "failed to decode assistant conversation");
                return false;
            }
        };
        self.state.write().await.conversation = conversation;
        true
    }
}
