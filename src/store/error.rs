use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// Invalid input, such as a malformed connection string
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database unreachable or pool could not be built
    #[error("Connection error: {0}")]
    Connection(String),

    /// SQL errors, constraint violations
    #[error("Database error: {0}")]
    Database(String),

    /// Connection pool issues
    #[error("Pool error: {0}")]
    Pool(String),

    /// A stored row could not be turned back into a domain value
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(err: tokio_postgres::Error) -> Self {
        if let Some(db_error) = err.as_db_error() {
            return StoreError::Database(format!(
                "{}: {}",
                db_error.code().code(),
                db_error.message()
            ));
        }

        StoreError::Database(err.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        StoreError::Pool(err.to_string())
    }
}

impl From<deadpool_postgres::BuildError> for StoreError {
    fn from(err: deadpool_postgres::BuildError) -> Self {
        StoreError::Connection(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(format!("JSON error: {}", err))
    }
}
