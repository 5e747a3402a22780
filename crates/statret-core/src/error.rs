//! # Error Types
//!
//! Errors raised while constructing core primitives. Everything here is a
//! validation failure on input that came from outside the engine: a year
//! typed by an operator, a timestamp read back from storage, an institution
//! code from configuration.

use thiserror::Error;

/// Error constructing a core primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The academic year cannot be encoded in a two-digit identifier prefix.
    #[error("academic year {year} is outside the supported range {min}..={max}")]
    YearOutOfRange {
        /// The rejected year.
        year: i32,
        /// Lowest accepted year.
        min: i32,
        /// Highest accepted year.
        max: i32,
    },

    /// A checksum key component has the wrong shape.
    #[error("invalid checksum key component '{component}': {reason}")]
    InvalidKeyComponent {
        /// Which component was rejected (institution, sequence).
        component: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// A generation name did not match any known schema generation.
    #[error("unknown return generation: {0:?}")]
    UnknownGeneration(String),

    /// A timestamp string could not be parsed.
    #[error("invalid timestamp {input:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        input: String,
        /// Parser diagnostic.
        reason: String,
    },
}
