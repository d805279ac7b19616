//! Error types for calsync.

use thiserror::Error;

/// Errors that can occur while reconciling calendars.
#[derive(Error, Debug)]
pub enum CalSyncError {
    #[error("Calendar access denied: {0}")]
    AccessDenied(String),

    #[error("Calendar not found: {0}")]
    CalendarNotFound(String),

    #[error("Failed to write to calendar store: {0}")]
    StoreWriteFailed(String),

    #[error("At least 2 calendars must participate, got {0}")]
    NotEnoughCalendars(usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CalSyncError {
    /// Whether this error aborts a whole run rather than a single action.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CalSyncError::StoreWriteFailed(_))
    }
}

/// Result type alias for calsync operations.
pub type CalSyncResult<T> = Result<T, CalSyncError>;
