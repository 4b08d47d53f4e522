use thiserror::Error;

/// Error taxonomy surfaced to callers. Every variant carries a human-readable
/// message; `code()` is the stable machine identifier.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid query: {message}")]
    InvalidQuery { message: String },
    #[error("forbidden: {message}")]
    Forbidden { message: String },
    #[error("storage unavailable: {message}")]
    StorageUnavailable { message: String },
    #[error("storage error: {message}")]
    Storage { message: String },
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl QueryError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            QueryError::InvalidQuery { .. } => "INVALID_QUERY",
            QueryError::Forbidden { .. } => "FORBIDDEN",
            QueryError::StorageUnavailable { .. } => "STORAGE_UNAVAILABLE",
            QueryError::Storage { .. } => "STORAGE_ERROR",
            QueryError::Internal { .. } => "INTERNAL",
        }
    }

    /// Transient errors the caller may retry; the engine itself never does.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueryError::StorageUnavailable { .. })
    }
}

pub type QueryResult<T> = Result<T, QueryError>;

impl From<sea_orm::DbErr> for QueryError {
    fn from(value: sea_orm::DbErr) -> Self {
        match value {
            sea_orm::DbErr::Conn(err) => QueryError::unavailable(err.to_string()),
            sea_orm::DbErr::ConnectionAcquire(err) => QueryError::unavailable(err.to_string()),
            other => QueryError::storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::QueryError;

    #[test]
    fn codes_are_stable() {
        assert_eq!(QueryError::invalid("x").code(), "INVALID_QUERY");
        assert_eq!(QueryError::forbidden("x").code(), "FORBIDDEN");
        assert_eq!(QueryError::unavailable("x").code(), "STORAGE_UNAVAILABLE");
        assert_eq!(QueryError::storage("x").code(), "STORAGE_ERROR");
        assert_eq!(QueryError::internal("x").code(), "INTERNAL");
        assert!(QueryError::unavailable("x").is_retryable());
        assert!(!QueryError::storage("x").is_retryable());
    }
}
