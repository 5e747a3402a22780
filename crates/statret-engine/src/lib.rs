//! # statret-engine — Statutory Return Engine
//!
//! Builds a regulatory student return for one academic year from a
//! snapshot of operational records, in either record generation:
//!
//! - **legacy**: one `Institution` holding courses, modules and students,
//!   keyed by `NUMHUS` instances.
//! - **data futures**: a `Batch` of reference collections (courses,
//!   modules, session years, venues) plus students with engagements,
//!   course sessions and reference-period loads.
//!
//! ## Pipeline
//!
//! ```text
//! RecordSource ─► Selection ─► populate (phases) ─► post_process
//!                                   │
//!                   commit (one transaction) ─► build_document ─► encode
//!                                                    │
//!                                  validate ─► ContentStore ─► record_output
//! ```
//!
//! [`ReturnService`] drives the pipeline and owns the batch lifecycle.
//! Population and post-processing are synchronous and never touch the
//! database, so they are usable on their own against an in-memory
//! [`statret_records::InMemoryRecords`].

pub mod config;
pub mod data_futures;
pub mod error;
pub mod legacy;
pub mod populate;
pub mod post_process;
pub mod progress;
pub mod service;

pub use config::{ConfigError, ReturnConfig, Venue};
pub use error::EngineError;
pub use populate::{populate, Population, PopulationOptions};
pub use post_process::{post_process, rules_for, Rule};
pub use progress::{NoProgress, ProgressEvent, ProgressSink, RecordingProgress, TracingProgress};
pub use service::{ReturnService, WrittenReturn};
