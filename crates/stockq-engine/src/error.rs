//! Error types for query processing

use thiserror::Error;

/// Errors raised while answering a query
#[derive(Debug, Error)]
pub enum QueryError {
    /// A data-access collaborator failed
    #[error("Data source error: {0}")]
    DataSource(String),

    /// A date string could not be parsed
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Not enough rows to run an analytic routine
    #[error("Insufficient data for {subject}: need {required} rows, have {available}")]
    InsufficientData {
        subject: String,
        required: usize,
        available: usize,
    },

    /// Technical indicator calculation error
    #[error("Technical indicator error: {0}")]
    Indicator(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// CSV decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl QueryError {
    /// Shorthand for an [`QueryError::InsufficientData`] error
    pub fn insufficient(subject: impl Into<String>, required: usize, available: usize) -> Self {
        Self::InsufficientData {
            subject: subject.into(),
            required,
            available,
        }
    }

    /// Whether this error reports too few rows rather than a failure
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}

/// Result type alias for query operations
pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QueryError::InvalidDate("2024-13-01".to_string());
        assert_eq!(err.to_string(), "Invalid date: 2024-13-01");

        let err = QueryError::insufficient("TCS.NS", 5, 4);
        assert_eq!(
            err.to_string(),
            "Insufficient data for TCS.NS: need 5 rows, have 4"
        );
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn test_io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "prices.csv");
        let err: QueryError = io.into();
        assert!(matches!(err, QueryError::Io(_)));
        assert!(!err.is_insufficient_data());
    }
}
