use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Invalid blob name: {0}")]
    InvalidName(String),

    #[error("Storage backend error: {0}")]
    Generic(String),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Insufficient permissions: {0}")]
    Forbidden(String),

    #[error("Authentication provider error: {0}")]
    Generic(String),
}

/// Errors surfaced by the marketplace operations.
///
/// The HTTP layer maps each variant to a status code; the message is shown to
/// the client as-is, so it names the violated constraint.
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),

    #[error("Database failure: {0}")]
    Database(String),
}

impl MarketError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// `true` for failures of the backing stores rather than of the request.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Database(_))
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for MarketError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => MarketError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                MarketError::Conflict(format!("Uniqueness violated: {}", db.message()))
            }
            other => MarketError::Database(other.to_string()),
        }
    }
}

pub type MarketResult<T> = Result<T, MarketError>;
