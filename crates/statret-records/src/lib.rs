//! # statret-records — Operational Data for the Return Engine
//!
//! The engine never owns enrolment, student or programme data; it reads a
//! snapshot of them through [`RecordSource`]. This crate defines the row
//! shapes it reads, an in-memory source backed by JSON/YAML snapshots, and
//! the one selection predicate every population phase shares.
//!
//! ## Population Membership
//!
//! [`Selection::build`] applies the predicate exactly once and resolves
//! every reference the phases will need. Phases iterate the selection;
//! they never re-filter the source. A module just outside the window is
//! therefore absent from *every* phase, not just the ones that remembered
//! to check.

pub mod error;
pub mod models;
pub mod selection;
pub mod source;

pub use error::RecordError;
pub use models::{
    Account, Coded, Domicile, Enrolment, EnrolmentResult, EnrolmentStatus, EntryQualification,
    LedgerLine, Module, Programme, Qualification, QualificationAim, Student, StudyLocation,
    SubjectShare,
};
pub use selection::{
    is_reportable, EnrolmentContext, SelectedAim, SelectedEnrolment, SelectedStudent, Selection,
};
pub use source::{InMemoryRecords, RecordSource, Snapshot};
