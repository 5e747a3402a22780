//! Per-year identifier counter.
//!
//! Values start at 0 and only ever increase. A value handed out is never
//! handed out again, even if the caller later fails.

use std::time::Duration;

use sqlx::SqlitePool;
use statret_core::AcademicYear;

use crate::error::StoreError;

/// Attempts before a busy database is reported as an error.
const MAX_ATTEMPTS: u32 = 8;

/// Allocate the next value for `year`.
pub async fn next_value(pool: &SqlitePool, year: AcademicYear) -> Result<i64, StoreError> {
    let mut attempt = 1;
    loop {
        match allocate(pool, year).await {
            Ok(value) => {
                tracing::debug!(year = %year, value, "sequence value allocated");
                return Ok(value);
            }
            Err(e) if is_busy(&e) && attempt < MAX_ATTEMPTS => {
                tracing::warn!(year = %year, attempt, "sequence counter busy, retrying");
                tokio::time::sleep(Duration::from_millis(20 * u64::from(attempt))).await;
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// The value the next allocation for `year` would return.
pub async fn peek(pool: &SqlitePool, year: AcademicYear) -> Result<i64, StoreError> {
    let value: Option<i64> =
        sqlx::query_scalar("SELECT next_value FROM sequence_counter WHERE year = ?1")
            .bind(year.value())
            .fetch_optional(pool)
            .await?;
    Ok(value.unwrap_or(0))
}

async fn allocate(pool: &SqlitePool, year: AcademicYear) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO sequence_counter (year, next_value) VALUES (?1, 1)
         ON CONFLICT (year) DO UPDATE SET next_value = next_value + 1
         RETURNING next_value - 1",
    )
    .bind(year.value())
    .fetch_one(pool)
    .await
}

/// SQLITE_BUSY or SQLITE_LOCKED, including extended codes.
fn is_busy(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => db
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .is_some_and(|code| matches!(code & 0xff, 5 | 6)),
        sqlx::Error::PoolTimedOut => true,
        _ => false,
    }
}
