/// Domain error taxonomy
///
/// Every fallible operation in the engine returns one of these variants so
/// callers can distinguish "doesn't exist" from "not allowed" from "would
/// corrupt state". The API layer maps them onto HTTP status codes.
///
/// # Example
///
/// ```
/// use boardwalk_shared::error::DomainError;
///
/// fn guard(is_owner: bool) -> Result<(), DomainError> {
///     if is_owner {
///         return Err(DomainError::InvalidOperation(
///             "cannot remove the project owner".to_string(),
///         ));
///     }
///     Ok(())
/// }
/// ```
use thiserror::Error;

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Unified error type for the Boardwalk domain core
#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced entity (project, issue, user, label) does not resolve
    #[error("{0} not found")]
    NotFound(String),

    /// The access policy denied the operation
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A uniqueness rule was violated (duplicate project key, duplicate membership)
    #[error("conflict: {0}")]
    Conflict(String),

    /// The operation is structurally invalid (removing the owner, reorder
    /// list that does not match the column)
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Input failed validation (missing or oversized fields)
    #[error("validation failed: {0}")]
    Validation(String),

    /// Underlying database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl DomainError {
    /// Shorthand for a NotFound on a named entity with an id
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DomainError::NotFound(format!("{} {}", entity, id))
    }
}

/// Extracts the violated constraint name from a database error, if any.
///
/// Used by the models to turn unique/foreign-key violations into Conflict
/// and NotFound instead of a generic database error.
pub fn constraint_of(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint().map(|c| c.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::NotFound("issue 42".to_string());
        assert_eq!(err.to_string(), "issue 42 not found");

        let err = DomainError::Forbidden("not a member".to_string());
        assert_eq!(err.to_string(), "forbidden: not a member");

        let err = DomainError::Conflict("project key BW already exists".to_string());
        assert!(err.to_string().contains("BW"));

        let err = DomainError::InvalidOperation("cannot demote the owner".to_string());
        assert!(err.to_string().starts_with("invalid operation"));
    }

    #[test]
    fn test_not_found_helper() {
        let err = DomainError::not_found("project", "abc");
        assert_eq!(err.to_string(), "project abc not found");
    }
}
