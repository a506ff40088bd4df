//! Portal commands, grouped by area.
//!
//! Every public command follows the same shape: an inner `try_*` function
//! does the work and the public wrapper passes its result through
//! `Portal::report`, which raises exactly one notification on failure.

mod announcements;
mod assistant;
mod classes;
mod content;
mod exams;
mod meets;
mod notifications;
mod pending;
mod polls;
mod session;
mod settings;
mod sharing;
mod users;

pub use pending::RetryReport;
pub use sharing::ShareOutcome;
