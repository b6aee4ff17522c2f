use quadmart_types::ListingId;
use thiserror::Error;

/// Failure of the underlying key-value primitive.
#[derive(Debug, Error)]
pub enum KvError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid storage key {0:?}")]
    InvalidKey(String),

    #[error("database lock poisoned")]
    Poisoned,

    #[error("blocking storage task failed")]
    Join(#[from] tokio::task::JoinError),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by listing store mutations. Reads never fail.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to save listings")]
    Write(#[source] KvError),

    #[error("failed to encode listings")]
    Encode(#[from] serde_json::Error),

    #[error("no listing with id {0}")]
    NotFound(ListingId),
}
