//! AI text collaborator

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::ConversationTurn;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("assistant is not configured")]
    NotConfigured,

    #[error("assistant request failed: {0}")]
    Request(String),

    #[error("assistant returned an empty answer")]
    EmptyAnswer,
}

/// Rewrite styles offered by the text corrector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewriteStyle {
    FixGrammar,
    Professional,
    Academic,
    Simplify,
    Concise,
    Casual,
    Persuasive,
}

impl RewriteStyle {
    pub const ALL: [RewriteStyle; 7] = [
        RewriteStyle::FixGrammar,
        RewriteStyle::Professional,
        RewriteStyle::Academic,
        RewriteStyle::Simplify,
        RewriteStyle::Concise,
        RewriteStyle::Casual,
        RewriteStyle::Persuasive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RewriteStyle::FixGrammar => "fix-grammar",
            RewriteStyle::Professional => "professional",
            RewriteStyle::Academic => "academic",
            RewriteStyle::Simplify => "simplify",
            RewriteStyle::Concise => "concise",
            RewriteStyle::Casual => "casual",
            RewriteStyle::Persuasive => "persuasive",
        }
    }
}

impl std::fmt::Display for RewriteStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RewriteStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RewriteStyle::ALL
            .iter()
            .copied()
            .find(|style| style.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown rewrite style: {s}"))
    }
}

/// Single-shot conversational and rewriting calls.
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Answer `message` given the prior turns of the conversation.
    async fn converse(
        &self,
        history: &[ConversationTurn],
        message: &str,
    ) -> Result<String, AssistantError>;

    /// Rewrite `text` in the requested style.
    async fn rewrite(&self, text: &str, style: RewriteStyle) -> Result<String, AssistantError>;
}
