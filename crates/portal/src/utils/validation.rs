//! Input validation utilities.

use regex::Regex;

use crate::types::{PortalError, PortalResult};

/// Reject empty or whitespace-only values.
pub fn require(value: &str, message: &str) -> PortalResult<()> {
    if value.trim().is_empty() {
        return Err(PortalError::validation(message));
    }
    Ok(())
}

/// Validate email format
pub fn validate_email(email: &str) -> PortalResult<()> {
    let email_regex = Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .map_err(|_| PortalError::validation("Invalid email regex"))?;

    if !email_regex.is_match(email) {
        return Err(PortalError::validation(format!("Adresse e-mail invalide : {email}")));
    }

    if email.len() > 255 {
        return Err(PortalError::validation("Adresse e-mail trop longue"));
    }

    Ok(())
}

/// A video-session link must be a non-empty http(s) URL.
pub fn validate_link(link: &str) -> PortalResult<()> {
    let link = link.trim();
    require(link, "Le lien est requis")?;

    let url_regex = Regex::new(r"^https?://[^\s/$.?#][^\s]*$")
        .map_err(|_| PortalError::validation("Invalid link regex"))?;

    if !url_regex.is_match(link) {
        return Err(PortalError::validation(format!("Lien invalide : {link}")));
    }
    Ok(())
}

/// Lower-case and trim an address before it is stored or compared.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("jean@x.com").is_ok());
        assert!(validate_email("prenom.nom+classe@lycee.fr").is_ok());
        assert!(validate_email("jean@").is_err());
        assert!(validate_email("not an email").is_err());
    }

    #[test]
    fn test_validate_link() {
        assert!(validate_link("https://meet.google.com/abc-defg-hij").is_ok());
        assert!(validate_link("http://visio.lycee.fr/salle1").is_ok());
        assert!(validate_link("").is_err());
        assert!(validate_link("meet.google.com/abc").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jean@X.com "), "jean@x.com");
    }
}
