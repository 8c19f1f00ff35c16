//! Error types shared by every manager and repository.

use thiserror::Error;

/// Errors raised by the tournament engine.
///
/// Domain variants map one-to-one onto the failure classes the API layer
/// distinguishes (bad input, duplicate keys, missing entities, forbidden
/// actions, and lifecycle violations). Any of them aborts the enclosing unit
/// of work.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input has the wrong shape or range
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A unique key is already taken
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Referenced entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Role or ownership check failed
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Operation is invalid for the current lifecycle state
    #[error("Invalid state: {0}")]
    State(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Database operation exceeded its time budget
    #[error("Database operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    pub fn forbidden() -> Self {
        Self::Authorization("You are not authorized to perform this action".to_string())
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Database errors are sanitized so SQL details never reach the caller.
    pub fn client_message(&self) -> String {
        match self {
            CoreError::Database(_) | CoreError::Timeout(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        let unique_violation = err
            .as_database_error()
            .is_some_and(|db_err| db_err.is_unique_violation());

        if unique_violation {
            let constraint = err
                .as_database_error()
                .and_then(|db_err| db_err.constraint())
                .unwrap_or("unique key")
                .to_string();
            CoreError::Conflict(format!("duplicate value violates {constraint}"))
        } else {
            CoreError::Database(err)
        }
    }
}

impl From<crate::db::timeouts::TimeoutError> for CoreError {
    fn from(err: crate::db::timeouts::TimeoutError) -> Self {
        match err {
            crate::db::timeouts::TimeoutError::Timeout(duration) => CoreError::Timeout(duration),
            crate::db::timeouts::TimeoutError::Database(e) => e.into(),
        }
    }
}

/// Result type for engine operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Turn a repository lookup into a `NotFound` error when empty.
pub fn require<T>(found: Option<T>, entity: &'static str) -> CoreResult<T> {
    found.ok_or(CoreError::NotFound(entity))
}
