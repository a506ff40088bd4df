//! Ecole Integrations Crate
//!
//! HTTP implementations of the portal's external collaborators:
//!
//! - [`GeminiAssistant`]: conversation and text rewriting through the
//!   Generative Language `generateContent` endpoint
//! - [`HttpMailer`]: JSON dispatch to a transactional mail provider

use thiserror::Error;

use ecole_portal::collaborators::{AssistantError, DeliveryError};

pub mod gemini;
pub mod mailer;

pub use gemini::GeminiAssistant;
pub use mailer::HttpMailer;

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("missing API key for {0}")]
    MissingApiKey(&'static str),
    #[error("missing endpoint for {0}")]
    MissingEndpoint(&'static str),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote service answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid response: {0}")]
    Response(#[from] serde_json::Error),
    #[error("response contained no text")]
    EmptyResponse,
}

impl From<IntegrationError> for AssistantError {
    fn from(err: IntegrationError) -> Self {
        match err {
            IntegrationError::MissingApiKey(_) => AssistantError::NotConfigured,
            IntegrationError::EmptyResponse => AssistantError::EmptyAnswer,
            other => AssistantError::Request(other.to_string()),
        }
    }
}

impl From<IntegrationError> for DeliveryError {
    fn from(err: IntegrationError) -> Self {
        match err {
            IntegrationError::MissingApiKey(_) | IntegrationError::MissingEndpoint(_) => {
                DeliveryError::NotConfigured
            }
            IntegrationError::Status { status, message } => {
                DeliveryError::Rejected { status, message }
            }
            other => DeliveryError::Unreachable(other.to_string()),
        }
    }
}

/// Pull a readable message out of an error body.
pub(crate) fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .or_else(|| value.get("message"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        });

    from_json
        .or_else(|| Some(body.trim().to_string()).filter(|text| !text.is_empty()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        })
}
