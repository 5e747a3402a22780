//! Errors raised while loading or resolving operational records.

use thiserror::Error;

/// Error reading the operational data store.
#[derive(Error, Debug)]
pub enum RecordError {
    /// A row references another row that does not exist.
    #[error("{referenced_by} references missing {entity} {id}")]
    Dangling {
        /// Kind of row that is missing.
        entity: &'static str,
        /// The missing identifier.
        id: String,
        /// The row holding the reference.
        referenced_by: String,
    },

    /// Two rows of the same kind share an identifier.
    #[error("duplicate {entity} id {id}")]
    Duplicate {
        /// Kind of row.
        entity: &'static str,
        /// The repeated identifier.
        id: String,
    },

    /// The snapshot file could not be parsed.
    #[error("snapshot parse error in {path}: {reason}")]
    Parse {
        /// Path of the snapshot.
        path: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// IO error reading a snapshot.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
