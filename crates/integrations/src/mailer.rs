//! Provider-backed e-mail delivery.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use ecole_config::MailConfig;
use ecole_portal::collaborators::{DeliveryError, DeliveryReceipt, EmailDelivery, OutgoingEmail};

use crate::{error_message, IntegrationError};

#[derive(Debug, Serialize)]
struct DispatchRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct DispatchResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Posts each message as JSON to a dispatch endpoint.
pub struct HttpMailer {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, IntegrationError> {
        let endpoint = config
            .endpoint
            .clone()
            .filter(|endpoint| !endpoint.trim().is_empty())
            .ok_or(IntegrationError::MissingEndpoint("mail provider"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
        })
    }

    async fn dispatch(&self, email: &OutgoingEmail) -> Result<DeliveryReceipt, IntegrationError> {
        let payload = DispatchRequest {
            from: &email.sender,
            to: &email.recipients,
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
        };

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(IntegrationError::Status {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        // Some providers answer 202 with an empty body.
        let parsed: DispatchResponse = if body.trim().is_empty() {
            DispatchResponse::default()
        } else {
            serde_json::from_str(&body)?
        };
        Ok(DeliveryReceipt::Accepted {
            reference: parsed.id,
        })
    }
}

#[async_trait]
impl EmailDelivery for HttpMailer {
    async fn deliver(&self, email: &OutgoingEmail) -> Result<DeliveryReceipt, DeliveryError> {
        if email.recipients.is_empty() {
            return Err(DeliveryError::NoRecipient);
        }

        match self.dispatch(email).await {
            Ok(receipt) => {
                info!(recipients = email.recipients.len(), "mail accepted by provider");
                Ok(receipt)
            }
            Err(err) => {
                warn!(error = %err, "mail dispatch failed");
                Err(err.into())
            }
        }
    }
}
