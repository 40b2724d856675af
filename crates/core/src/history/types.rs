//! Types for the history store.

use thiserror::Error;

/// Errors for history operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Series not found: {0}")]
    SeriesNotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for HistoryError {
    fn from(e: rusqlite::Error) -> Self {
        HistoryError::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HistoryError::SeriesNotFound("Some Show".to_string());
        assert_eq!(err.to_string(), "Series not found: Some Show");

        let err = HistoryError::Database("disk I/O error".to_string());
        assert_eq!(err.to_string(), "Database error: disk I/O error");
    }
}
