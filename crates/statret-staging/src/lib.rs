//! # statret-staging — Staging Schema and Tree
//!
//! A return document is a tree of typed nodes whose shape is fixed by the
//! regulator. This crate declares that shape as data and holds a batch's
//! populated nodes.
//!
//! ## Schema as Data
//!
//! Each node type is an [`EntityDef`]: its element name, its fields in
//! emission order (with required flags and defaults), and its child node
//! types in emission order. The tables for both generations live in
//! [`legacy`] and [`data_futures`]. Nothing downstream switches on entity
//! names; the serializer reads these tables and nothing else.
//!
//! ## Arena Tree
//!
//! [`StagingTree`] stores records in one flat arena. Parent links are
//! record handles, never references, and children are resolved through a
//! `(parent, kind)` index. Natural keys are unique per kind, which lets a
//! phase find a record written by an earlier phase by the key it derives
//! from the same source row.

pub mod data_futures;
pub mod error;
pub mod legacy;
pub mod schema;
pub mod tree;

pub use error::StagingError;
pub use schema::{EntityDef, FieldDef, FieldDefault, SchemaDef};
pub use tree::{Children, RecordId, StagingRecord, StagingRow, StagingTree};
