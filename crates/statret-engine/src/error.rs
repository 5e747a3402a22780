//! Engine errors.

use statret_core::{BatchId, CoreError};
use statret_records::RecordError;
use statret_staging::StagingError;
use statret_state::BatchState;
use statret_store::StoreError;
use statret_xml::XmlError;
use thiserror::Error;

use crate::config::ConfigError;

/// Failure of a return run.
///
/// Any error raised while a batch is populating leaves that batch `Failed`
/// with no staging rows.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The operational records could not be read or do not resolve.
    #[error("records: {0}")]
    Records(#[from] RecordError),

    /// A record could not be placed in the staging tree.
    #[error("staging: {0}")]
    Staging(#[from] StagingError),

    /// Persistence failed.
    #[error("store: {0}")]
    Store(#[from] StoreError),

    /// An identifier could not be generated.
    #[error("identifier: {0}")]
    Core(#[from] CoreError),

    /// The document could not be built or encoded.
    #[error("document: {0}")]
    Xml(#[from] XmlError),

    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    /// A selected person has no identifier after allocation.
    #[error("student {student} has no person identifier")]
    MissingIdentifier {
        /// Internal student id.
        student: i64,
    },

    /// The per-year counter has run past what an identifier can hold.
    #[error("identifier sequence exhausted: {value}")]
    SequenceExhausted {
        /// The value the counter returned.
        value: i64,
    },

    /// No batch with this id exists.
    #[error("batch {0} not found")]
    BatchNotFound(BatchId),

    /// The batch has no staging tree to write.
    #[error("batch {batch} is {state}, not populated")]
    NotPopulated {
        /// Batch id.
        batch: BatchId,
        /// Its current state.
        state: BatchState,
    },
}
