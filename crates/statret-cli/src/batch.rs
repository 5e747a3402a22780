//! # Batch Subcommands
//!
//! `create`, `write` and `list`. Each opens the batch database named by
//! the configuration, runs one service operation, and prints a short
//! summary on stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use statret_core::{AcademicYear, BatchId, Generation};
use statret_engine::{ReturnConfig, TracingProgress, WrittenReturn};
use statret_records::InMemoryRecords;
use statret_store::BatchRecord;

use crate::{connect, parse_year, runtime};

/// Arguments for `statret create`.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Academic year, by the calendar year it starts in (e.g. 2022).
    #[arg(long, value_parser = parse_year)]
    pub year: AcademicYear,

    /// Record generation: `legacy` or `data-futures`.
    #[arg(long)]
    pub generation: Generation,

    /// Snapshot of the operational records (.json, .yaml or .yml).
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Recorded as the batch's creator.
    #[arg(long, default_value = "statret")]
    pub created_by: String,
}

/// Arguments for `statret write`.
#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Batch to serialize.
    #[arg(long)]
    pub batch: i64,
}

/// Arguments for `statret list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Show at most this many batches.
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Build and write a new batch.
pub fn run_create(args: &CreateArgs, config: &ReturnConfig) -> Result<u8> {
    let records = InMemoryRecords::from_path(&args.snapshot)
        .with_context(|| format!("failed to load snapshot {}", args.snapshot.display()))?;

    runtime()?.block_on(async {
        let service = connect(config).await?;
        let written = service
            .create(
                args.year,
                args.generation,
                &args.created_by,
                &records,
                &TracingProgress,
            )
            .await
            .with_context(|| format!("{} batch for {} failed", args.generation, args.year))?;
        print_written(&written);
        Ok(exit_code(&written))
    })
}

/// Re-serialize a populated batch.
pub fn run_write(args: &WriteArgs, config: &ReturnConfig) -> Result<u8> {
    let batch = BatchId(args.batch);
    runtime()?.block_on(async {
        let service = connect(config).await?;
        let written = service
            .write(batch)
            .await
            .with_context(|| format!("writing batch {batch} failed"))?;
        print_written(&written);
        Ok(exit_code(&written))
    })
}

/// Print batch history.
pub fn run_list(args: &ListArgs, config: &ReturnConfig) -> Result<u8> {
    runtime()?.block_on(async {
        let service = connect(config).await?;
        let records = service.list().await.context("listing batches failed")?;
        let shown = args.limit.unwrap_or(records.len());
        for record in records.iter().take(shown) {
            println!("{}", describe(record));
        }
        Ok(0)
    })
}

fn print_written(written: &WrittenReturn) {
    println!("batch {}: {}", written.batch, written.path.display());
    println!("  sha256 {}", written.output.digest);
    for (message, count) in &written.output.errors {
        println!("  {count:>5} × {message}");
    }
}

/// 0 when the document is clean, 2 when it was written with validation errors.
fn exit_code(written: &WrittenReturn) -> u8 {
    if written.output.errors.is_empty() {
        0
    } else {
        2
    }
}

/// One line of `statret list` output.
pub fn describe(record: &BatchRecord) -> String {
    let mut line = format!(
        "{:>6}  {:<12}  {}  {:<10}  {}  {}",
        record.id(),
        record.generation.as_str(),
        record.year,
        record.state().to_string(),
        record.lifecycle.created_at,
        record.created_by,
    );
    if let Some(output) = &record.output {
        let errors: usize = output.errors.values().sum();
        line.push_str(&format!("  {} ({errors} errors)", output.filename));
    }
    if let Some(reason) = &record.failure_reason {
        line.push_str(&format!("  failed: {reason}"));
    }
    line
}
