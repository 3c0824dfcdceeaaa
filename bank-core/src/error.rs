use thiserror::Error;

/// Error taxonomy for the banking core.
///
/// Domain failures (`NotFound`, `InvalidState`, `InsufficientFunds`,
/// `SameAccount`, `BadRequest`, `Conflict`) are reported outcomes: no state
/// change has been committed when one is returned. `StorageUnavailable` is
/// reserved for store connectivity/write failures and is never collapsed into
/// a domain failure.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Invalid state: {0}")]
    InvalidState(anyhow::Error),

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Cannot transfer to the same account")]
    SameAccount,

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(anyhow::Error),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(anyhow::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    /// Whether retrying the failed call can succeed without any state change
    /// in between. Only storage outages qualify; every domain failure is a
    /// definitive outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::StorageUnavailable(_))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::StorageUnavailable(anyhow::Error::new(err))
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}
