//! The portal context object and the plumbing shared by every command.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use ecole_config::AppConfig;
use ecole_database::{codec, Filter, Record, Row, StoreAdapter, StoreError, StoreResult, Table};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::collaborators::{Assistant, EmailDelivery, IdentityResolver, MailtoHandoff, StoreIdentityResolver};
use crate::entities::{
    AiConversation, AuditLogEntry, ClassGroup, ClassScoped, Notification, NotificationType, Page,
    Severity, User,
};
use crate::notifications::{AuditTrail, Notifier};
use crate::pending::{merge_vote, PendingChange};
use crate::state::{AppState, DomainState, Entity, Mutation};
use crate::types::{PortalError, PortalResult};
use crate::utils::new_id;

const DEFAULT_TOAST_TTL_MS: i64 = 5000;
const DEFAULT_AUDIT_CAPACITY: usize = 50;

/// Explicit application context: store, session state and collaborators.
///
/// Commands are `async fn(&self)` methods defined across the `services`
/// modules. The state lock is never held across a store or collaborator
/// call, so commands interleave at those points.
#[derive(Clone)]
pub struct Portal {
    pub(crate) store: Arc<dyn StoreAdapter>,
    pub(crate) state: Arc<RwLock<AppState>>,
    pub(crate) audit: Arc<AuditTrail>,
    pub(crate) identity: Arc<dyn IdentityResolver>,
    pub(crate) assistant: Option<Arc<dyn Assistant>>,
    pub(crate) mailer: Arc<dyn EmailDelivery>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) sender_address: String,
    pub(crate) default_school_name: String,
}

pub struct PortalBuilder {
    store: Arc<dyn StoreAdapter>,
    identity: Option<Arc<dyn IdentityResolver>>,
    assistant: Option<Arc<dyn Assistant>>,
    mailer: Option<Arc<dyn EmailDelivery>>,
    clock: Option<Arc<dyn Clock>>,
    toast_ttl: Duration,
    audit_capacity: usize,
    school_name: String,
    sender_address: String,
}

impl PortalBuilder {
    /// Apply the notification, audit, school and mail sections.
    pub fn config(mut self, config: &AppConfig) -> Self {
        let ttl_ms = i64::try_from(config.notifications.toast_ttl_ms).unwrap_or(DEFAULT_TOAST_TTL_MS);
        self.toast_ttl = Duration::milliseconds(ttl_ms);
        self.audit_capacity = config.audit.retry_buffer_capacity;
        self.school_name = config.school.default_name.clone();
        self.sender_address = config.mail.sender_address.clone();
        self
    }

    pub fn identity(mut self, identity: Arc<dyn IdentityResolver>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn assistant(mut self, assistant: Arc<dyn Assistant>) -> Self {
        self.assistant = Some(assistant);
        self
    }

    pub fn mailer(mut self, mailer: Arc<dyn EmailDelivery>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn toast_ttl(mut self, ttl: Duration) -> Self {
        self.toast_ttl = ttl;
        self
    }

    pub fn audit_capacity(mut self, capacity: usize) -> Self {
        self.audit_capacity = capacity;
        self
    }

    pub fn school_name(mut self, name: impl Into<String>) -> Self {
        self.school_name = name.into();
        self
    }

    pub fn build(self) -> Portal {
        let identity = self
            .identity
            .unwrap_or_else(|| Arc::new(StoreIdentityResolver::new(self.store.clone())));
        let state = AppState::new(self.school_name.clone(), Notifier::new(self.toast_ttl));

        Portal {
            store: self.store,
            state: Arc::new(RwLock::new(state)),
            audit: Arc::new(AuditTrail::new(self.audit_capacity)),
            identity,
            assistant: self.assistant,
            mailer: self.mailer.unwrap_or_else(|| Arc::new(MailtoHandoff)),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            sender_address: self.sender_address,
            default_school_name: self.school_name,
        }
    }
}

impl Portal {
    pub fn builder(store: Arc<dyn StoreAdapter>) -> PortalBuilder {
        PortalBuilder {
            store,
            identity: None,
            assistant: None,
            mailer: None,
            clock: None,
            toast_ttl: Duration::milliseconds(DEFAULT_TOAST_TTL_MS),
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
            school_name: ecole_config::SchoolConfig::default().default_name,
            sender_address: ecole_config::MailConfig::default().sender_address,
        }
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn current_user(&self) -> Option<User> {
        self.state.read().await.current_user.clone()
    }

    pub async fn school_name(&self) -> String {
        self.state.read().await.school_name.clone()
    }

    /// Cloned view of every entity collection.
    pub async fn snapshot(&self) -> DomainState {
        self.state.read().await.domain.clone()
    }

    pub async fn all<T: Entity>(&self) -> Vec<T> {
        self.state.read().await.domain.all::<T>()
    }

    pub async fn get<T: Entity>(&self, id: &str) -> Option<T> {
        self.state.read().await.domain.get::<T>(id).cloned()
    }

    pub async fn conversation(&self) -> Option<AiConversation> {
        self.state.read().await.conversation.clone()
    }

    /// Audit entries still waiting to reach the store.
    pub async fn buffered_audit_entries(&self) -> Vec<AuditLogEntry> {
        self.audit.buffered().await
    }

    pub(crate) async fn notify(
        &self,
        message: impl Into<String>,
        notification_type: NotificationType,
        target_page: Option<Page>,
    ) -> Notification {
        let now = self.now();
        let mut state = self.state.write().await;
        state
            .notifier
            .notify(message, notification_type, target_page, now)
    }

    /// Turn a failed command into its single user-facing notification.
    pub(crate) async fn report<T>(
        &self,
        result: PortalResult<T>,
        page: Option<Page>,
    ) -> PortalResult<T> {
        if let Err(err) = &result {
            if err.is_validation() {
                warn!(error = %err, "command rejected");
            } else {
                error!(error = %err, "command failed");
            }
            self.notify(err.user_message(), err.notification_type(), page)
                .await;
        }
        result
    }

    pub(crate) async fn acting_user(&self) -> PortalResult<User> {
        self.current_user().await.ok_or(PortalError::NotSignedIn)
    }

    pub(crate) async fn require_admin(&self) -> PortalResult<User> {
        let user = self.acting_user().await?;
        if !user.is_admin() {
            return Err(PortalError::forbidden(
                "Action réservée aux administrateurs",
            ));
        }
        Ok(user)
    }

    pub(crate) async fn require_publisher(&self) -> PortalResult<User> {
        let user = self.acting_user().await?;
        if !user.can_publish() {
            return Err(PortalError::forbidden(
                "Action réservée aux responsables de classe",
            ));
        }
        Ok(user)
    }

    /// Class new content goes into: the admin's explicit choice, or the
    /// responsible's own class.
    pub(crate) async fn target_class(
        &self,
        author: &User,
        requested: Option<&str>,
    ) -> PortalResult<String> {
        if author.is_admin() {
            let class_id = requested
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .ok_or_else(|| PortalError::validation("Choisissez une classe"))?;
            if self.get::<ClassGroup>(class_id).await.is_none() {
                return Err(PortalError::not_found("Classe", class_id));
            }
            return Ok(class_id.to_string());
        }

        author
            .class_id
            .clone()
            .ok_or_else(|| PortalError::validation("Aucune classe n'est associée à votre compte"))
    }

    pub(crate) fn ensure_can_manage(author: &User, class_id: &str) -> PortalResult<()> {
        if author.is_admin() || author.class_id.as_deref() == Some(class_id) {
            return Ok(());
        }
        Err(PortalError::forbidden(
            "Ce contenu appartient à une autre classe",
        ))
    }

    /// Replace one collection with a full fetch, replaying pending changes.
    /// Failures are logged and leave the previous collection in place.
    pub(crate) async fn load<T: Entity>(&self) -> bool {
        let table = T::TABLE;
        let rows = match self.store.select_all(table).await {
            Ok(rows) => rows,
            Err(err) => {
                error!(%table, error = %err, "failed to load collection");
                return false;
            }
        };
        let values = match codec::decode_all::<T>(rows) {
            Ok(values) => values,
            Err(err) => {
                error!(%table, error = %err, "failed to decode collection");
                return false;
            }
        };

        let mut state = self.state.write().await;
        match state.pending.reconcile(values) {
            Ok(values) => {
                state.domain.replace(values);
                true
            }
            Err(err) => {
                error!(%table, error = %err, "failed to reconcile collection");
                false
            }
        }
    }

    /// After any successful store write, flush buffered audit entries.
    pub(crate) async fn after_write(&self) {
        self.audit.drain(self.store.as_ref()).await;
    }

    /// Remote-confirmed insert: local state changes only once the store
    /// accepted the row.
    pub(crate) async fn confirmed_insert<T: Entity>(&self, value: T) -> PortalResult<T> {
        let stored = self.store.insert(T::TABLE, codec::encode(&value)?).await?;
        let stored: T = codec::decode(stored)?;
        self.state
            .write()
            .await
            .domain
            .apply(Mutation::Insert(stored.clone()));
        self.after_write().await;
        Ok(stored)
    }

    pub(crate) async fn confirmed_update<T: Entity, P: Serialize>(
        &self,
        id: &str,
        patch: &P,
    ) -> PortalResult<T> {
        let patch_row = non_empty_patch(patch)?;
        let stored = self
            .store
            .update(T::TABLE, id, codec::to_remote(patch_row))
            .await?;
        let stored: T = codec::decode(stored)?;
        self.state
            .write()
            .await
            .domain
            .apply(Mutation::Update(stored.clone()));
        self.after_write().await;
        Ok(stored)
    }

    pub(crate) async fn confirmed_delete<T: Entity>(&self, id: &str) -> PortalResult<()> {
        self.store.delete(T::TABLE, id).await?;
        self.state
            .write()
            .await
            .domain
            .apply(Mutation::<T>::Delete(id.to_string()));
        self.after_write().await;
        Ok(())
    }

    /// Optimistic write: mutate local state, queue the change, then send it.
    /// A failed send leaves local state as is and the operation queued.
    pub(crate) async fn optimistic<T: Entity>(
        &self,
        mutation: Mutation<T>,
        entity_id: &str,
        change: PendingChange,
    ) -> PortalResult<Option<Row>> {
        let now = self.now();
        let op_id = {
            let mut state = self.state.write().await;
            state.domain.apply(mutation);
            state
                .pending
                .register(T::TABLE, entity_id, change.clone(), now)
        };

        match self.send_change(T::TABLE, entity_id, &change, false).await {
            Ok(saved) => {
                self.state.write().await.pending.settle(&op_id);
                self.after_write().await;
                Ok(saved)
            }
            Err(err) => {
                let table = T::TABLE;
                warn!(%table, entity = %entity_id, error = %err, "optimistic write failed");
                self.state
                    .write()
                    .await
                    .pending
                    .fail(&op_id, err.to_string());
                Err(err.into())
            }
        }
    }

    /// Send one queued change. Votes come back with the merged server row.
    pub(crate) async fn send_change(
        &self,
        table: Table,
        entity_id: &str,
        change: &PendingChange,
        retry: bool,
    ) -> StoreResult<Option<Row>> {
        match change {
            PendingChange::Upsert { row } => {
                let remote = codec::to_remote(row.clone());
                if retry {
                    self.store.upsert(table, "id", remote).await?;
                } else {
                    self.store.insert(table, remote).await?;
                }
                Ok(None)
            }
            PendingChange::Patch { row } => {
                self.store
                    .update(table, entity_id, codec::to_remote(row.clone()))
                    .await?;
                Ok(None)
            }
            PendingChange::Delete => {
                self.store.delete(table, entity_id).await?;
                Ok(None)
            }
            PendingChange::Vote { option_id, user_id } => {
                self.send_vote(entity_id, option_id, user_id).await.map(Some)
            }
        }
    }

    /// Re-read the poll, merge the vote by user id and write the options back.
    async fn send_vote(&self, poll_id: &str, option_id: &str, user_id: &str) -> StoreResult<Row> {
        let fresh = self
            .store
            .select_where(Table::Polls, &Filter::eq("id", poll_id))
            .await?;
        let mut poll = fresh
            .into_iter()
            .next()
            .map(codec::from_remote)
            .ok_or_else(|| StoreError::not_found(Table::Polls, poll_id))?;

        merge_vote(&mut poll, option_id, user_id);

        let mut patch = Row::new();
        patch.insert(
            "options".to_string(),
            poll.get("options").cloned().unwrap_or(Value::Array(Vec::new())),
        );
        self.store.update(Table::Polls, poll_id, patch).await
    }

    /// Record an audit entry locally and append it to the store. Never fails.
    pub(crate) async fn audit(
        &self,
        actor: &User,
        action: impl Into<String>,
        details: impl Into<String>,
        severity: Severity,
    ) {
        let entry = AuditLogEntry {
            id: new_id(),
            action: action.into(),
            details: details.into(),
            author: actor.name.clone(),
            role: actor.role,
            timestamp: self.now(),
            severity,
        };

        info!(action = %entry.action, author = %entry.author, severity = ?entry.severity, "audit");
        self.state
            .write()
            .await
            .domain
            .apply(Mutation::Insert(entry.clone()));
        if self.audit.append(self.store.as_ref(), entry).await {
            self.after_write().await;
        }
    }

    /// Look up class content and check the actor may change it.
    pub(crate) async fn managed<T: Entity + ClassScoped>(
        &self,
        actor: &User,
        id: &str,
    ) -> PortalResult<T> {
        let current = self
            .get::<T>(id)
            .await
            .ok_or_else(|| PortalError::not_found(T::LABEL, id))?;
        Self::ensure_can_manage(actor, current.class_id())?;
        Ok(current)
    }
}

/// Serialize a patch, refusing one that changes nothing.
pub(crate) fn non_empty_patch<P: Serialize>(patch: &P) -> PortalResult<Row> {
    let row = codec::to_client_row(patch)?;
    if row.is_empty() {
        return Err(PortalError::validation("Aucune modification"));
    }
    Ok(row)
}

/// Apply a client-shaped patch to an entity.
pub(crate) fn patched<T: Record>(current: &T, patch: &Row) -> PortalResult<T> {
    let mut row = codec::to_client_row(current)?;
    for (key, value) in patch {
        if key != "id" {
            row.insert(key.clone(), value.clone());
        }
    }
    Ok(codec::from_client_row(row)?)
}
