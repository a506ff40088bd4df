//! Shared error and result types for the store layer

pub mod errors;

pub use errors::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;
