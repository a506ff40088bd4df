//! Error types for portal commands.

use ecole_database::StoreError;
use thiserror::Error;

use crate::collaborators::{AssistantError, DeliveryError};
use crate::entities::NotificationType;

/// Failure of a single portal command.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("{0}")]
    Validation(String),

    #[error("No user is signed in")]
    NotSignedIn,

    #[error("{0}")]
    Forbidden(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Assistant unavailable: {0}")]
    Assistant(String),

    #[error("E-mail delivery failed: {0}")]
    Delivery(String),
}

impl From<AssistantError> for PortalError {
    fn from(err: AssistantError) -> Self {
        PortalError::Assistant(err.to_string())
    }
}

impl From<DeliveryError> for PortalError {
    fn from(err: DeliveryError) -> Self {
        PortalError::Delivery(err.to_string())
    }
}

impl PortalError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Rejected before any store call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PortalError::Validation(_)
                | PortalError::NotSignedIn
                | PortalError::Forbidden(_)
                | PortalError::NotFound { .. }
        )
    }

    /// Kind of notification raised for this failure.
    pub fn notification_type(&self) -> NotificationType {
        if self.is_validation() {
            NotificationType::Warning
        } else {
            NotificationType::Error
        }
    }

    /// Message shown to the acting user.
    pub fn user_message(&self) -> String {
        match self {
            PortalError::Store(err) => match err {
                StoreError::Constraint(message) | StoreError::Rejected { message, .. }
                    if !message.is_empty() =>
                {
                    format!("Erreur : {message}")
                }
                StoreError::Unavailable(_) => {
                    "Erreur : le serveur est injoignable, réessayez plus tard.".to_string()
                }
                _ => "Une erreur est survenue.".to_string(),
            },
            other => other.to_string(),
        }
    }
}
