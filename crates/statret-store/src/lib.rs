//! # statret-store — Batch Persistence
//!
//! SQLite persistence through SQLx. All functions take a `&SqlitePool`
//! and are free functions grouped by table, the way the batch workflow
//! uses them:
//!
//! - [`batches`]: headers, the atomic population commit, failure and
//!   output recording, loading a batch and its staging tree.
//! - [`sequence`]: the per-year identifier counter. Allocation is a single
//!   `INSERT .. ON CONFLICT .. RETURNING` statement, so two overlapping
//!   runs can never receive the same value.
//! - [`identifiers`]: person identifiers the engine allocated, so a
//!   student keeps one identifier across batches.
//! - [`content`]: generated documents on disk, under
//!   `<media_root>/<subsystem>/<filename>`.

pub mod batches;
pub mod content;
pub mod error;
pub mod identifiers;
pub mod sequence;

pub use batches::{BatchOutput, BatchRecord, NewBatch};
pub use content::{sha256_hex, ContentStore};
pub use error::StoreError;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

/// Open (creating if needed) the database at `url` and run migrations.
pub async fn init_pool(url: &str) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await?;

    tracing::info!("Connected to SQLite");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}
