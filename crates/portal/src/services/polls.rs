//! Class polls and single-choice voting.

use ecole_database::codec;
use serde_json::{json, Map};
use tracing::debug;

use crate::entities::{ClassScoped, NotificationType, Page, Poll, PollOption, PollType};
use crate::pending::PendingChange;
use crate::portal::Portal;
use crate::state::Mutation;
use crate::types::{NewPoll, PollUpdate, PortalError, PortalResult};
use crate::utils::new_id;

const PAGE: Page = Poll::PAGE;

impl Portal {
    pub async fn create_poll(&self, request: NewPoll) -> PortalResult<Poll> {
        let result = self.try_create_poll(request).await;
        self.report(result, Some(PAGE)).await
    }

    async fn try_create_poll(&self, request: NewPoll) -> PortalResult<Poll> {
        let author = self.require_publisher().await?;
        request.validate()?;
        let class_id = self.target_class(&author, request.class_id.as_deref()).await?;

        let options = request
            .options
            .iter()
            .map(|label| label.trim())
            .filter(|label| !label.is_empty())
            .map(|label| PollOption {
                id: new_id(),
                label: label.to_string(),
                voter_ids: Vec::new(),
            })
            .collect();
        let poll = Poll {
            id: new_id(),
            question: request.question.trim().to_string(),
            poll_type: PollType::Single,
            options,
            active: true,
            created_at: self.now(),
            is_anonymous: request.is_anonymous,
            class_id,
        };
        let poll = self.create_content(poll).await?;

        self.notify("Sondage créé", NotificationType::Success, Some(PAGE))
            .await;
        Ok(poll)
    }

    pub async fn update_poll(&self, id: &str, patch: PollUpdate) -> PortalResult<Poll> {
        let result = self.try_update_poll(id, patch).await;
        self.report(result, Some(PAGE)).await
    }

    async fn try_update_poll(&self, id: &str, mut patch: PollUpdate) -> PortalResult<Poll> {
        let author = self.require_publisher().await?;
        patch.validate()?;
        patch.question = patch.question.map(|question| question.trim().to_string());

        let poll: Poll = self.update_content(&author, id, &patch).await?;

        self.notify("Sondage modifié", NotificationType::Success, Some(PAGE))
            .await;
        Ok(poll)
    }

    /// Open or close a poll for voting.
    pub async fn set_poll_active(&self, id: &str, active: bool) -> PortalResult<Poll> {
        let result = self.try_set_poll_active(id, active).await;
        self.report(result, Some(PAGE)).await
    }

    async fn try_set_poll_active(&self, id: &str, active: bool) -> PortalResult<Poll> {
        let author = self.require_publisher().await?;
        let mut patch = Map::new();
        patch.insert("active".to_string(), json!(active));

        let poll: Poll = self.update_content(&author, id, &patch).await?;

        let message = if active {
            "Sondage rouvert"
        } else {
            "Sondage clôturé"
        };
        self.notify(message, NotificationType::Success, Some(PAGE))
            .await;
        Ok(poll)
    }

    pub async fn delete_poll(&self, id: &str) -> PortalResult<()> {
        let result = self.try_delete_poll(id).await;
        self.report(result, Some(PAGE)).await
    }

    async fn try_delete_poll(&self, id: &str) -> PortalResult<()> {
        let author = self.require_publisher().await?;
        let _: Poll = self.delete_content(&author, id).await?;

        self.notify("Sondage supprimé", NotificationType::Success, Some(PAGE))
            .await;
        Ok(())
    }

    /// Cast or move the signed-in user's single vote.
    ///
    /// Without a signed-in user this does nothing and returns `Ok(None)`.
    /// Re-voting the same option leaves the data unchanged but still
    /// notifies.
    pub async fn vote(&self, poll_id: &str, option_id: &str) -> PortalResult<Option<Poll>> {
        let result = self.try_vote(poll_id, option_id).await;
        self.report(result, Some(PAGE)).await
    }

    async fn try_vote(&self, poll_id: &str, option_id: &str) -> PortalResult<Option<Poll>> {
        let Some(voter) = self.current_user().await else {
            debug!(poll = %poll_id, "vote ignored without a signed-in user");
            return Ok(None);
        };

        let mut poll = self
            .get::<Poll>(poll_id)
            .await
            .ok_or_else(|| PortalError::not_found("Sondage", poll_id))?;
        if !poll.active {
            return Err(PortalError::validation("Ce sondage est clôturé"));
        }
        if !poll.cast_vote(option_id, &voter.id) {
            return Err(PortalError::validation("Option de sondage inconnue"));
        }

        let change = PendingChange::Vote {
            option_id: option_id.to_string(),
            user_id: voter.id.clone(),
        };
        let saved = self
            .optimistic(Mutation::Update(poll.clone()), poll_id, change)
            .await?;

        // The store merged the vote into its own copy; adopt it.
        if let Some(row) = saved {
            let server: Poll = codec::decode(row)?;
            let mut state = self.state.write().await;
            let reconciled = state.pending.reconcile(vec![server])?;
            if let Some(value) = reconciled.into_iter().find(|value| value.id == poll_id) {
                state.domain.apply(Mutation::Update(value.clone()));
                poll = value;
            }
        }

        self.notify("Vote enregistré", NotificationType::Success, Some(PAGE))
            .await;
        Ok(Some(poll))
    }
}
