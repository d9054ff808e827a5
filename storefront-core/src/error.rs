use sqlx::error::ErrorKind;
use thiserror::Error;

/// SQLite reports a refused `ON DELETE RESTRICT` with the generic
/// constraint-trigger code, which sqlx does not classify.
const RESTRICT_MESSAGE: &str = "FOREIGN KEY constraint failed";

/// Result alias used throughout the core.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced to the presentation shell.
///
/// Every variant is recoverable at the boundary: after any of them the
/// store is left as it was before the call.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Bad user input (empty required field, non-positive quantity,
    /// insufficient stock, malformed report parameter).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A foreign-key restriction or unique constraint refused the write.
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// The invoice commit/delete transaction failed and was rolled back.
    #[error("invoice transaction rolled back: {0}")]
    Commit(#[source] Box<StoreError>),

    /// Any other storage failure.
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        StoreError::NotFound { entity, id }
    }

    /// Wraps a failure that happened inside an invoice transaction.
    pub fn commit(cause: impl Into<StoreError>) -> Self {
        StoreError::Commit(Box::new(cause.into()))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.kind() {
                ErrorKind::ForeignKeyViolation => {
                    return StoreError::Constraint(format!(
                        "record is still referenced: {}",
                        db_err.message()
                    ));
                }
                ErrorKind::UniqueViolation => {
                    return StoreError::Constraint(format!(
                        "duplicate value: {}",
                        db_err.message()
                    ));
                }
                _ if db_err.message() == RESTRICT_MESSAGE => {
                    return StoreError::Constraint(format!(
                        "record is still referenced: {}",
                        db_err.message()
                    ));
                }
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_keeps_cause_as_source() {
        let err = StoreError::commit(StoreError::validation("stock underflow"));
        let source = std::error::Error::source(&err).expect("commit error has a source");
        assert_eq!(source.to_string(), "validation failed: stock underflow");
        assert!(err.to_string().starts_with("invoice transaction rolled back"));
    }

    #[test]
    fn test_not_found_message() {
        let err = StoreError::not_found("product", 42);
        assert_eq!(err.to_string(), "product 42 not found");
    }

    #[test]
    fn test_row_not_found_is_database_error() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[test]
    fn test_database_error_keeps_sqlx_source() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        let source = std::error::Error::source(&err).expect("database error has a source");
        assert_eq!(source.to_string(), sqlx::Error::RowNotFound.to_string());
    }
}
