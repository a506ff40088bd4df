//! Sharing class resources by e-mail.

use serde::Serialize;
use tracing::{info, warn};

use crate::collaborators::{DeliveryReceipt, OutgoingEmail};
use crate::entities::{
    Announcement, ClassScoped, Exam, Meet, NotificationType, Poll, ResourceType, SentEmailRecord,
    Severity, User,
};
use crate::portal::Portal;
use crate::types::{PortalError, PortalResult, ShareRequest};
use crate::utils::new_id;
use crate::utils::validation::normalize_email;

/// The stored record and what the mail collaborator did with the message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareOutcome {
    pub record: SentEmailRecord,
    pub receipt: DeliveryReceipt,
}

/// Subject, plain-text body and class of a shared resource.
struct Composed {
    subject: String,
    body: String,
    class_id: String,
}

impl Portal {
    /// Persist a share record, then hand the message to the mail
    /// collaborator. A delivery failure is reported but the record stays.
    pub async fn share_resource(&self, request: ShareRequest) -> PortalResult<ShareOutcome> {
        let page = page_of(request.resource_type);
        let result = self.try_share_resource(request).await;
        self.report(result, Some(page)).await
    }

    async fn try_share_resource(&self, request: ShareRequest) -> PortalResult<ShareOutcome> {
        let sender = self.require_publisher().await?;
        request.validate()?;

        let school = self.school_name().await;
        let composed = self
            .compose(request.resource_type, &request.resource_id, &school)
            .await?;
        Self::ensure_can_manage(&sender, &composed.class_id)?;

        let recipients = self
            .recipients_for(&sender, request.recipient.as_deref(), &composed.class_id)
            .await;
        if recipients.is_empty() {
            return Err(PortalError::validation("Aucun destinataire pour ce partage"));
        }

        let record = SentEmailRecord {
            id: new_id(),
            created_at: self.now(),
            recipient_email: Some(recipients.join(", ")),
            subject: composed.subject.clone(),
            body: composed.body.clone(),
            resource_type: request.resource_type,
            sender_name: sender.name.clone(),
            class_id: composed.class_id.clone(),
        };
        let record = self.confirmed_insert(record).await?;
        self.audit(
            &sender,
            "Partage par e-mail",
            format!(
                "{} {} envoyé(e) à {} destinataire(s)",
                request.resource_type.label(),
                request.resource_id,
                recipients.len()
            ),
            Severity::Info,
        )
        .await;

        let email = OutgoingEmail {
            recipients,
            subject: composed.subject,
            html: render_html(&composed.body, &school),
            text: composed.body,
            sender: self.sender_address.clone(),
        };
        let receipt = match self.mailer.deliver(&email).await {
            Ok(receipt) => receipt,
            Err(err) => {
                warn!(record = %record.id, error = %err, "share delivery failed");
                return Err(err.into());
            }
        };

        info!(record = %record.id, recipients = email.recipients.len(), "resource shared");
        self.notify(
            format!("E-mail préparé pour {} destinataire(s)", email.recipients.len()),
            NotificationType::Success,
            Some(page_of(request.resource_type)),
        )
        .await;
        Ok(ShareOutcome { record, receipt })
    }

    async fn compose(
        &self,
        resource_type: ResourceType,
        resource_id: &str,
        school: &str,
    ) -> PortalResult<Composed> {
        let missing = || PortalError::not_found(resource_type.label(), resource_id);
        let composed = match resource_type {
            ResourceType::Announcement => {
                let announcement = self.get::<Announcement>(resource_id).await.ok_or_else(missing)?;
                Composed {
                    subject: format!("[{school}] Annonce : {}", announcement.title),
                    body: format!(
                        "{}\n\n{}\n\nPublié le {}",
                        announcement.title,
                        announcement.content,
                        announcement.date.format("%d/%m/%Y")
                    ),
                    class_id: announcement.class_id,
                }
            }
            ResourceType::Meet => {
                let meet = self.get::<Meet>(resource_id).await.ok_or_else(missing)?;
                Composed {
                    subject: format!("[{school}] Visio : {}", meet.subject),
                    body: format!(
                        "Visio {} avec {}\nLe {}\nLien : {}",
                        meet.subject,
                        meet.teacher_name,
                        meet.date.format("%d/%m/%Y à %H:%M"),
                        meet.link
                    ),
                    class_id: meet.class_id,
                }
            }
            ResourceType::Exam => {
                let exam = self.get::<Exam>(resource_id).await.ok_or_else(missing)?;
                let mut body = format!(
                    "Examen de {}\nLe {}\nDurée : {} min\nSalle : {}",
                    exam.subject,
                    exam.date.format("%d/%m/%Y à %H:%M"),
                    exam.duration_minutes,
                    exam.room
                );
                if let Some(notes) = &exam.notes {
                    body.push_str(&format!("\nNotes : {notes}"));
                }
                Composed {
                    subject: format!("[{school}] Examen : {}", exam.subject),
                    body,
                    class_id: exam.class_id,
                }
            }
            ResourceType::Poll => {
                let poll = self.get::<Poll>(resource_id).await.ok_or_else(missing)?;
                let mut body = format!("Sondage : {}\n", poll.question);
                for option in &poll.options {
                    body.push_str(&format!("\n- {}", option.label));
                }
                if !poll.active {
                    body.push_str("\n\nCe sondage est clôturé.");
                }
                Composed {
                    subject: format!("[{school}] Sondage : {}", poll.question),
                    body,
                    class_id: poll.class_id,
                }
            }
        };
        Ok(composed)
    }

    /// The explicit recipient, or every class member except the sender.
    async fn recipients_for(
        &self,
        sender: &User,
        explicit: Option<&str>,
        class_id: &str,
    ) -> Vec<String> {
        if let Some(recipient) = explicit.filter(|r| !r.trim().is_empty()) {
            return vec![normalize_email(recipient)];
        }
        self.state
            .read()
            .await
            .domain
            .class_members(class_id)
            .into_iter()
            .filter(|member| member.id != sender.id)
            .map(|member| member.email)
            .collect()
    }
}

fn page_of(resource_type: ResourceType) -> crate::entities::Page {
    match resource_type {
        ResourceType::Announcement => Announcement::PAGE,
        ResourceType::Meet => Meet::PAGE,
        ResourceType::Exam => Exam::PAGE,
        ResourceType::Poll => Poll::PAGE,
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn render_html(body: &str, school: &str) -> String {
    let paragraphs: Vec<String> = body
        .split("\n\n")
        .map(|paragraph| format!("<p>{}</p>", escape_html(paragraph).replace('\n', "<br>")))
        .collect();
    format!(
        "<div>{}<hr><p><small>{}</small></p></div>",
        paragraphs.join(""),
        escape_html(school)
    )
}
