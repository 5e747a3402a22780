//! # statret-core — Foundational Types for the Return Engine
//!
//! The leaf of the workspace DAG. Every other `statret-*` crate depends on
//! it; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Validated newtypes.** `AcademicYear` rejects years the regulator's
//!    identifier scheme cannot encode. `BatchId` cannot be confused with a
//!    source-table id.
//!
//! 2. **Deterministic natural keys.** Everything in [`keys`] is a pure
//!    function of its inputs. Re-deriving a key from the same source row
//!    yields the same string, which is what lets parent and child staging
//!    records be written independently and re-joined later.
//!
//! 3. **Final representation only.** [`FieldValue`] holds a value exactly
//!    as it will appear in the document. There is no internal enum that
//!    a serializer would have to translate.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `statret-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod keys;
pub mod temporal;
pub mod value;

pub use error::CoreError;
pub use identity::{AcademicYear, BatchId, Generation};
pub use keys::{checksum_digit, ChecksumKey};
pub use temporal::{DateSpan, ReferencePeriod, ReportingWindow, Timestamp};
pub use value::FieldValue;
