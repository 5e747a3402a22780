//! Serializer and encoder errors.

use thiserror::Error;

/// Failure building or encoding a document.
#[derive(Error, Debug)]
pub enum XmlError {
    /// A record handle does not belong to the tree being serialized.
    #[error("no staging record {0} in this tree")]
    UnknownRecord(usize),

    /// The markup writer rejected an event.
    #[error("document encoding failed: {0}")]
    Encode(String),

    /// The encoded bytes were not valid UTF-8.
    #[error("encoded document is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
