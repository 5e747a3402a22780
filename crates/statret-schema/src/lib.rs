//! # statret-schema — Document Validation
//!
//! Checks an encoded return document against the regulator's XML Schema
//! definition. Validation never blocks generation: violations are grouped
//! by message and counted, and the counts are attached to the batch for
//! an operator to review.
//!
//! The definition is read from a local file or fetched over HTTP (see
//! [`SchemaSource`]) and applied with libxml2 through the `libxml` crate.
//! libxml2 enforces element order, cardinality and the simple-type
//! restrictions the regulator declares.

pub mod source;
pub mod validate;

pub use source::SchemaSource;
pub use validate::{validate_with, DocumentValidator, SchemaValidationError, ValidationReport};
