//! Assistant conversation history

use chrono::{DateTime, Utc};
use ecole_database::{Record, Table};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
        }
    }
}

/// One conversation per user, upserted by `userId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiConversation {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub turns: Vec<ConversationTurn>,
    pub updated_at: DateTime<Utc>,
}

impl Record for AiConversation {
    const TABLE: Table = Table::AiConversations;

    fn id(&self) -> &str {
        &self.id
    }
}
