//! # Identifier Subcommand
//!
//! `next-id` allocates one value from the per-year counter and prints it
//! as a checksum identifier: a 13-digit person identifier by default, or
//! a 17-digit student identifier with `--sid`.

use anyhow::{Context, Result};
use clap::Args;
use statret_core::AcademicYear;
use statret_engine::ReturnConfig;

use crate::{connect, parse_year, runtime};

/// Arguments for `statret next-id`.
#[derive(Args, Debug)]
pub struct NextIdArgs {
    /// Academic year the identifier is allocated in.
    #[arg(long, value_parser = parse_year)]
    pub year: AcademicYear,

    /// Generate a 17-digit student identifier keyed by the UKPRN.
    #[arg(long)]
    pub sid: bool,
}

pub fn run_next_id(args: &NextIdArgs, config: &ReturnConfig) -> Result<u8> {
    let key = if args.sid {
        config.sid_key()?
    } else {
        config.husid_key()?
    };
    runtime()?.block_on(async {
        let service = connect(config).await?;
        let id = service
            .next_identifier(&key, args.year)
            .await
            .context("identifier allocation failed")?;
        println!("{id}");
        Ok(0)
    })
}
