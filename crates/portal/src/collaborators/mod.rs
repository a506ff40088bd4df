//! External collaborators the portal talks to through narrow traits.

pub mod assistant;
pub mod identity;
pub mod mail;

pub use assistant::{Assistant, AssistantError, RewriteStyle};
pub use identity::{IdentityResolver, StoreIdentityResolver};
pub use mail::{DeliveryError, DeliveryReceipt, EmailDelivery, MailtoHandoff, OutgoingEmail};
