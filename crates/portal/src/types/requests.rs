//! Request types for portal commands.
//!
//! `New*` requests create an entity; `*Update` requests are partial patches
//! whose unset fields are left out of the serialized form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{ResourceType, Role, Urgency};
use crate::types::{PortalError, PortalResult};
use crate::utils::validation::{require, validate_email, validate_link};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClass {
    pub name: String,
    pub description: Option<String>,
    pub contact_email: Option<String>,
}

impl NewClass {
    pub fn validate(&self) -> PortalResult<()> {
        require(&self.name, "Le nom de la classe est requis")?;
        if let Some(email) = self.contact_email.as_deref().filter(|e| !e.trim().is_empty()) {
            validate_email(email)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

impl ClassUpdate {
    pub fn validate(&self) -> PortalResult<()> {
        if let Some(name) = &self.name {
            require(name, "Le nom de la classe est requis")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub class_id: Option<String>,
    pub avatar: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> PortalResult<()> {
        require(&self.name, "Le nom est requis")?;
        require(&self.email, "L'e-mail est requis")?;
        validate_email(self.email.trim())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Refused for administrators; promoting a user to ADMIN clears it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl UserUpdate {
    pub fn validate(&self) -> PortalResult<()> {
        if let Some(name) = &self.name {
            require(name, "Le nom est requis")?;
        }
        if let Some(email) = &self.email {
            validate_email(email.trim())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnnouncement {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub urgency: Urgency,
    /// Required for administrators, ignored for class responsibles.
    pub class_id: Option<String>,
}

impl NewAnnouncement {
    pub fn validate(&self) -> PortalResult<()> {
        require(&self.title, "Le titre est requis")?;
        require(&self.content, "Le contenu est requis")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
}

impl AnnouncementUpdate {
    pub fn validate(&self) -> PortalResult<()> {
        if let Some(title) = &self.title {
            require(title, "Le titre est requis")?;
        }
        if let Some(content) = &self.content {
            require(content, "Le contenu est requis")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMeet {
    pub subject: String,
    pub teacher_name: String,
    pub link: String,
    pub date: DateTime<Utc>,
    pub class_id: Option<String>,
}

impl NewMeet {
    pub fn validate(&self) -> PortalResult<()> {
        require(&self.subject, "La matière est requise")?;
        require(&self.teacher_name, "Le nom de l'enseignant est requis")?;
        validate_link(&self.link)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

impl MeetUpdate {
    pub fn validate(&self) -> PortalResult<()> {
        if let Some(subject) = &self.subject {
            require(subject, "La matière est requise")?;
        }
        if let Some(link) = &self.link {
            validate_link(link)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExam {
    pub subject: String,
    pub date: DateTime<Utc>,
    pub duration_minutes: u32,
    pub room: String,
    pub notes: Option<String>,
    pub class_id: Option<String>,
}

impl NewExam {
    pub fn validate(&self) -> PortalResult<()> {
        require(&self.subject, "La matière est requise")?;
        require(&self.room, "La salle est requise")?;
        validate_duration(self.duration_minutes)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ExamUpdate {
    pub fn validate(&self) -> PortalResult<()> {
        if let Some(subject) = &self.subject {
            require(subject, "La matière est requise")?;
        }
        if let Some(room) = &self.room {
            require(room, "La salle est requise")?;
        }
        if let Some(duration) = self.duration_minutes {
            validate_duration(duration)?;
        }
        Ok(())
    }
}

fn validate_duration(minutes: u32) -> PortalResult<()> {
    if minutes == 0 {
        return Err(PortalError::validation("La durée doit être supérieure à 0"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPoll {
    pub question: String,
    /// Option labels, in display order.
    pub options: Vec<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    pub class_id: Option<String>,
}

impl NewPoll {
    pub fn validate(&self) -> PortalResult<()> {
        require(&self.question, "La question est requise")?;
        let labelled = self
            .options
            .iter()
            .filter(|label| !label.trim().is_empty())
            .count();
        if labelled == 0 {
            return Err(PortalError::validation("Le sondage doit avoir au moins une option"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_anonymous: Option<bool>,
}

impl PollUpdate {
    pub fn validate(&self) -> PortalResult<()> {
        if let Some(question) = &self.question {
            require(question, "La question est requise")?;
        }
        Ok(())
    }
}

/// Share a class resource by e-mail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub resource_type: ResourceType,
    pub resource_id: String,
    /// Explicit recipient; every member of the resource's class otherwise.
    pub recipient: Option<String>,
}

impl ShareRequest {
    pub fn validate(&self) -> PortalResult<()> {
        require(&self.resource_id, "Ressource manquante")?;
        if let Some(recipient) = self.recipient.as_deref().filter(|r| !r.trim().is_empty()) {
            validate_email(recipient.trim())?;
        }
        Ok(())
    }
}

/// Outcome of a CSV user import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}
