//! Ecole Portal Crate
//!
//! Session state and commands for the school portal: classes and users,
//! class content (announcements, video sessions, exams, polls), sharing by
//! e-mail and the writing assistant.
//!
//! ## Layout
//!
//! - [`Portal`]: the shared context object; every command is an `async`
//!   method on it
//! - [`state`]: the in-memory mirror of each store table
//! - [`pending`]: optimistic writes awaiting confirmation, replayed on load
//! - [`notifications`]: toasts, session history and the audit trail
//! - [`collaborators`]: identity, assistant and e-mail seams
//!
//! A command never panics and never surfaces more than one notification:
//! validation failures raise a WARNING, store and collaborator failures an
//! ERROR.

pub mod clock;
pub mod collaborators;
pub mod entities;
pub mod notifications;
pub mod pending;
pub mod portal;
pub mod services;
pub mod state;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod types;
pub mod utils;

pub use clock::{Clock, SystemClock};
pub use portal::{Portal, PortalBuilder};
pub use services::{RetryReport, ShareOutcome};
pub use state::{AppState, DomainState};
pub use types::{PortalError, PortalResult};
