//! Errors raised while building or restoring a staging tree.

use thiserror::Error;

/// A staging tree operation violated the schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StagingError {
    /// The entity kind is not declared by the schema.
    #[error("unknown entity kind {kind:?}")]
    UnknownEntity {
        /// The undeclared kind.
        kind: String,
    },

    /// The field tag is not declared for the entity kind.
    #[error("{kind} has no field {tag:?}")]
    UnknownField {
        /// Entity kind.
        kind: String,
        /// The undeclared tag.
        tag: String,
    },

    /// A record of this kind already uses the key.
    #[error("duplicate {kind} key {key:?}")]
    DuplicateKey {
        /// Entity kind.
        kind: String,
        /// The repeated natural key.
        key: String,
    },

    /// The kind cannot be placed under the given parent (or at the root).
    #[error("{kind} cannot be a child of {parent}")]
    NotAChild {
        /// Entity kind being inserted.
        kind: String,
        /// Parent kind, or `root`.
        parent: String,
    },

    /// A parent handle does not refer to a record in this tree.
    #[error("{kind} {key:?} references missing parent record {parent}")]
    MissingParent {
        /// Entity kind being inserted.
        kind: String,
        /// Its natural key.
        key: String,
        /// The dangling handle.
        parent: usize,
    },

    /// A record handle does not refer to a record in this tree.
    #[error("no staging record {0}")]
    UnknownRecord(usize),

    /// Restored rows are not in dense id order.
    #[error("staging row {found} out of order (expected {expected})")]
    RowOrder {
        /// Id that should have come next.
        expected: usize,
        /// Id actually found.
        found: usize,
    },
}
