//! Persistence errors.

use statret_core::BatchId;
use statret_staging::StagingError;
use statret_state::BatchStateError;
use thiserror::Error;

/// A storage operation failed.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The database rejected a query or the connection failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Embedded migrations could not be applied.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// No batch with this id exists.
    #[error("batch {0} not found")]
    NotFound(BatchId),

    /// A stored value could not be decoded.
    #[error("batch {batch} has corrupt {column}: {reason}")]
    Corrupt {
        /// The batch whose row is corrupt.
        batch: BatchId,
        /// Column or table holding the bad value.
        column: &'static str,
        /// Decoder diagnostic.
        reason: String,
    },

    /// Stored staging rows do not form a valid tree.
    #[error("staging rows rejected: {0}")]
    Staging(#[from] StagingError),

    /// The requested lifecycle transition is not allowed.
    #[error("lifecycle: {0}")]
    State(#[from] BatchStateError),

    /// Reading or writing a document failed.
    #[error("content store error at {path}: {source}")]
    Io {
        /// File or directory being accessed.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
