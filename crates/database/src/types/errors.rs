//! Error types for the store layer

use thiserror::Error;

use crate::table::Table;

/// Failure reported by a store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Record not found in {table}: {id}")]
    NotFound { table: Table, id: String },

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid record: {0}")]
    Decode(String),

    #[error("Invalid filter column: {0}")]
    InvalidColumn(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn not_found(table: Table, id: impl Into<String>) -> Self {
        Self::NotFound {
            table,
            id: id.into(),
        }
    }

    /// Whether retrying the same call later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Unavailable(_) | StoreError::Database(_) => true,
            StoreError::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE constraint failed") => {
                StoreError::Constraint(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StoreError::not_found(Table::Exams, "e1");
        assert_eq!(err.to_string(), "Record not found in exams: e1");

        let err = StoreError::Rejected {
            status: 409,
            message: "duplicate key".to_string(),
        };
        assert_eq!(err.to_string(), "Store rejected the request (409): duplicate key");
    }

    #[test]
    fn transient_errors_are_classified() {
        assert!(StoreError::Unavailable("offline".into()).is_transient());
        assert!(StoreError::Rejected { status: 503, message: String::new() }.is_transient());
        assert!(!StoreError::Rejected { status: 400, message: String::new() }.is_transient());
        assert!(!StoreError::Constraint("email".into()).is_transient());
    }
}
