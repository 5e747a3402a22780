//! # statret-state — Batch Lifecycle
//!
//! A batch is created once per request and moves through a short,
//! one-way lifecycle. Population is atomic: a batch is either fully
//! populated or failed, never half-built.
//!
//! ```text
//! Populating ──▶ Populated ──▶ Complete ──▶ Complete (re-serialized)
//!      │
//!      ▼
//!   Failed (terminal)
//! ```
//!
//! Staging records may only be written while `Populating` and corrected
//! while `Populated`. Once `Complete`, the tree is read-only; writing the
//! document again only records a new output.

pub mod batch;

pub use batch::{BatchLifecycle, BatchState, BatchStateError, BatchTransitionRecord};
