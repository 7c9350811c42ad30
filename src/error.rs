use thiserror::Error;

/// Errors raised by the place store, the dialogue flows and the poll coordinator.
#[derive(Debug, Error)]
pub enum BotError {
    /// A place with the same normalized name is already stored.
    #[error("place '{0}' already exists")]
    Duplicate(String),

    /// The named place or poll does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The caller may not perform a privileged action.
    #[error("not authorized")]
    NotAuthorized,

    /// User input failed validation.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The message targeted for cleanup is already gone.
    #[error("message {0} can no longer be deleted")]
    NotDeletable(i32),

    /// A poll has no votes to decide a winner.
    #[error("not enough poll data")]
    InsufficientData,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias used across the crate's core.
pub type BotResult<T> = Result<T, BotError>;

impl BotError {
    /// Store-connectivity failures abort a flow instead of being recovered.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BotError::Database(_) | BotError::Serialization(_))
    }
}
