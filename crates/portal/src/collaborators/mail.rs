//! E-mail delivery collaborator

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("no recipient")]
    NoRecipient,

    #[error("mail provider is not configured")]
    NotConfigured,

    #[error("mail provider rejected the message ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("mail provider unreachable: {0}")]
    Unreachable(String),
}

/// A composed message ready for hand-off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub recipients: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub sender: String,
}

/// What the collaborator did with the message. Neither variant means the
/// message was delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryReceipt {
    /// A `mailto:` URL for the local mail client.
    HandedOff { url: String },
    /// Accepted by a provider for later delivery.
    Accepted { reference: Option<String> },
}

#[async_trait]
pub trait EmailDelivery: Send + Sync {
    async fn deliver(&self, email: &OutgoingEmail) -> Result<DeliveryReceipt, DeliveryError>;
}

/// Builds a `mailto:` URL instead of sending anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct MailtoHandoff;

impl MailtoHandoff {
    pub fn url_for(email: &OutgoingEmail) -> String {
        let recipients: Vec<String> = email
            .recipients
            .iter()
            .map(|recipient| urlencoding::encode(recipient.trim()).into_owned())
            .collect();

        format!(
            "mailto:{}?subject={}&body={}",
            recipients.join(","),
            urlencoding::encode(&email.subject),
            urlencoding::encode(&email.text)
        )
    }
}

#[async_trait]
impl EmailDelivery for MailtoHandoff {
    async fn deliver(&self, email: &OutgoingEmail) -> Result<DeliveryReceipt, DeliveryError> {
        if email.recipients.is_empty() {
            return Err(DeliveryError::NoRecipient);
        }
        Ok(DeliveryReceipt::HandedOff {
            url: Self::url_for(email),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(recipients: Vec<&str>) -> OutgoingEmail {
        OutgoingEmail {
            recipients: recipients.into_iter().map(String::from).collect(),
            subject: "Examen : Algèbre".into(),
            html: "<p>Lundi 9h</p>".into(),
            text: "Lundi 9h & salle S1".into(),
            sender: "no-reply@ecole.local".into(),
        }
    }

    #[tokio::test]
    async fn mailto_url_is_percent_encoded() {
        let receipt = MailtoHandoff
            .deliver(&email(vec!["jean@x.com", "marie@x.com"]))
            .await
            .unwrap();

        assert_eq!(
            receipt,
            DeliveryReceipt::HandedOff {
                url: "mailto:jean%40x.com,marie%40x.com?subject=Examen%20%3A%20Alg%C3%A8bre&body=Lundi%209h%20%26%20salle%20S1".into()
            }
        );
    }

    #[tokio::test]
    async fn mailto_requires_a_recipient() {
        let err = MailtoHandoff.deliver(&email(vec![])).await.unwrap_err();
        assert!(matches!(err, DeliveryError::NoRecipient));
    }
}
