//! # statret-cli — Statutory Return Command Line
//!
//! Provides the `statret` command-line interface over
//! [`statret_engine::ReturnService`].
//!
//! ## Subcommands
//!
//! - `statret create`: Build, write and record a new batch for a year.
//! - `statret write`: Re-serialize an existing populated batch.
//! - `statret next-id`: Allocate a checksum identifier from the year counter.
//! - `statret list`: Show batch history, newest first.
//!
//! ```bash
//! statret create --year 2022 --generation data-futures --snapshot records.json
//! statret write --batch 14
//! statret next-id --year 2022 --sid
//! ```
//!
//! Handlers take a resolved [`ReturnConfig`] and return a process exit
//! code; `main` owns environment loading and tracing setup.

pub mod batch;
pub mod identifier;

use anyhow::Context;
use statret_core::AcademicYear;
use statret_engine::{ReturnConfig, ReturnService};

/// Parse a `--year` argument: the calendar year the academic year starts in.
pub fn parse_year(s: &str) -> Result<AcademicYear, String> {
    let value: i32 = s
        .trim()
        .parse()
        .map_err(|_| format!("expected a four-digit year, got {s:?}"))?;
    AcademicYear::new(value).map_err(|e| e.to_string())
}

/// Single-threaded runtime for one command.
pub(crate) fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

pub(crate) async fn connect(config: &ReturnConfig) -> anyhow::Result<ReturnService> {
    ReturnService::connect(config.clone())
        .await
        .context("failed to open batch database")
}
