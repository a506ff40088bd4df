//! Internal utilities

pub mod csv;
pub mod ids;
pub mod validation;

pub use ids::new_id;
