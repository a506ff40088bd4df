//! Gemini-backed writing assistant.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ecole_config::AssistantConfig;
use ecole_portal::collaborators::{Assistant, AssistantError, RewriteStyle};
use ecole_portal::entities::{ConversationTurn, TurnRole};

use crate::{error_message, IntegrationError};

const CONVERSATION_INSTRUCTION: &str = "Tu es l'assistant pédagogique d'un établissement scolaire. \
Réponds en français, de façon claire et bienveillante, à des élèves, enseignants et responsables de classe.";

/// Instruction sent with a rewrite request.
pub fn rewrite_instruction(style: RewriteStyle) -> &'static str {
    match style {
        RewriteStyle::FixGrammar => {
            "Corrige l'orthographe, la grammaire et la ponctuation du texte sans en changer le sens ni le ton."
        }
        RewriteStyle::Professional => {
            "Réécris le texte dans un registre professionnel et courtois, adapté à une communication officielle."
        }
        RewriteStyle::Academic => {
            "Réécris le texte dans un style académique, précis et structuré."
        }
        RewriteStyle::Simplify => {
            "Simplifie le texte pour qu'il soit compris facilement par un jeune élève."
        }
        RewriteStyle::Concise => "Raccourcis le texte en gardant uniquement l'essentiel.",
        RewriteStyle::Casual => "Réécris le texte sur un ton détendu et amical.",
        RewriteStyle::Persuasive => {
            "Réécris le texte de façon convaincante pour inciter le lecteur à agir."
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> Content<'a> {
    fn text(role: Option<&'static str>, text: &'a str) -> Self {
        Self {
            role,
            parts: vec![Part { text }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        Some(text.trim().to_string()).filter(|text| !text.is_empty())
    }
}

pub struct GeminiAssistant {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiAssistant {
    pub fn new(config: &AssistantConfig) -> Result<Self, IntegrationError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(IntegrationError::MissingApiKey("gemini"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, IntegrationError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = error_message(status, &body);
            warn!(status = status.as_u16(), %message, "gemini request failed");
            return Err(IntegrationError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)?;
        let text = parsed.into_text().ok_or(IntegrationError::EmptyResponse)?;
        debug!(model = %self.model, chars = text.chars().count(), "gemini answered");
        Ok(text)
    }
}

#[async_trait]
impl Assistant for GeminiAssistant {
    async fn converse(
        &self,
        history: &[ConversationTurn],
        message: &str,
    ) -> Result<String, AssistantError> {
        let mut contents: Vec<Content<'_>> = history
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    TurnRole::User => "user",
                    TurnRole::Model => "model",
                };
                Content::text(Some(role), &turn.text)
            })
            .collect();
        contents.push(Content::text(Some("user"), message));

        let request = GenerateRequest {
            system_instruction: Content::text(None, CONVERSATION_INSTRUCTION),
            contents,
        };
        Ok(self.generate(&request).await?)
    }

    async fn rewrite(&self, text: &str, style: RewriteStyle) -> Result<String, AssistantError> {
        let request = GenerateRequest {
            system_instruction: Content::text(None, rewrite_instruction(style)),
            contents: vec![Content::text(Some("user"), text)],
        };
        Ok(self.generate(&request).await?)
    }
}
