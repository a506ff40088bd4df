//! Assistant conversation and text rewriting.
//!
//! These commands notify only when they fail; the answer itself is the
//! feedback.

use std::sync::Arc;

use ecole_database::{codec, Record};
use tracing::{debug, warn};

use crate::collaborators::{Assistant, AssistantError, RewriteStyle};
use crate::entities::{AiConversation, ConversationTurn, Page};
use crate::portal::Portal;
use crate::types::PortalResult;
use crate::utils::new_id;
use crate::utils::validation::require;

impl Portal {
    fn assistant_client(&self) -> PortalResult<Arc<dyn Assistant>> {
        self.assistant
            .clone()
            .ok_or_else(|| AssistantError::NotConfigured.into())
    }

    /// Send `message` with the stored conversation and record both turns.
    pub async fn ask_assistant(&self, message: &str) -> PortalResult<String> {
        let result = self.try_ask_assistant(message).await;
        self.report(result, Some(Page::Assistant)).await
    }

    async fn try_ask_assistant(&self, message: &str) -> PortalResult<String> {
        let user = self.acting_user().await?;
        require(message, "Le message est vide")?;
        let assistant = self.assistant_client()?;

        let history = self
            .conversation()
            .await
            .filter(|conversation| conversation.user_id == user.id)
            .map(|conversation| conversation.turns)
            .unwrap_or_default();

        let answer = assistant.converse(&history, message.trim()).await?;
        if answer.trim().is_empty() {
            return Err(AssistantError::EmptyAnswer.into());
        }

        let conversation = {
            let now = self.now();
            let mut state = self.state.write().await;
            let conversation = state
                .conversation
                .get_or_insert_with(|| AiConversation {
                    id: new_id(),
                    user_id: user.id.clone(),
                    turns: Vec::new(),
                    updated_at: now,
                });
            conversation.turns.push(ConversationTurn::user(message.trim()));
            conversation.turns.push(ConversationTurn::model(answer.clone()));
            conversation.updated_at = now;
            conversation.clone()
        };
        self.save_conversation(&conversation).await;
        Ok(answer)
    }

    /// Rewrite `text` in the given style. Nothing is stored.
    pub async fn rewrite_text(&self, text: &str, style: RewriteStyle) -> PortalResult<String> {
        let result = self.try_rewrite_text(text, style).await;
        self.report(result, Some(Page::Assistant)).await
    }

    async fn try_rewrite_text(&self, text: &str, style: RewriteStyle) -> PortalResult<String> {
        self.acting_user().await?;
        require(text, "Le texte est vide")?;
        let assistant = self.assistant_client()?;

        let rewritten = assistant.rewrite(text, style).await?;
        if rewritten.trim().is_empty() {
            return Err(AssistantError::EmptyAnswer.into());
        }
        debug!(%style, chars = rewritten.chars().count(), "text rewritten");
        Ok(rewritten)
    }

    /// Forget the signed-in user's conversation.
    pub async fn reset_conversation(&self) -> PortalResult<()> {
        let result = self.try_reset_conversation().await;
        self.report(result, Some(Page::Assistant)).await
    }

    async fn try_reset_conversation(&self) -> PortalResult<()> {
        self.acting_user().await?;
        let Some(conversation) = self.state.write().await.conversation.take() else {
            return Ok(());
        };
        if let Err(err) = self
            .store
            .delete(AiConversation::TABLE, &conversation.id)
            .await
        {
            warn!(conversation = %conversation.id, error = %err, "failed to delete stored conversation");
        } else {
            self.after_write().await;
        }
        Ok(())
    }

    /// Upsert by user id. Failures only lose history, so they are logged.
    async fn save_conversation(&self, conversation: &AiConversation) {
        let row = match codec::encode(conversation) {
            Ok(row) => row,
            Err(err) => {
                warn!(error = %err, "failed to encode conversation");
                return;
            }
        };
        match self.store.upsert(AiConversation::TABLE, "user_id", row).await {
            Ok(_) => self.after_write().await,
            Err(err) => {
                warn!(user = %conversation.user_id, error = %err, "failed to save conversation");
            }
        }
    }
}
