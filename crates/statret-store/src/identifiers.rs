//! Person identifiers allocated by the engine.

use std::collections::HashMap;

use sqlx::SqlitePool;
use statret_core::{AcademicYear, Timestamp};

use crate::error::StoreError;

/// Previously allocated identifiers for the given students.
pub async fn find_many(
    pool: &SqlitePool,
    students: &[i64],
) -> Result<HashMap<i64, String>, StoreError> {
    let mut found = HashMap::new();
    for student in students {
        let husid: Option<String> =
            sqlx::query_scalar("SELECT husid FROM student_identifier WHERE student_id = ?1")
                .bind(*student)
                .fetch_optional(pool)
                .await?;
        if let Some(husid) = husid {
            found.insert(*student, husid);
        }
    }
    Ok(found)
}

/// Remember an identifier allocated for a student, unless one is already
/// stored. Returns the identifier the student ends up with, which differs
/// from `husid` when an overlapping run stored one first.
pub async fn assign(
    pool: &SqlitePool,
    student: i64,
    husid: &str,
    year: AcademicYear,
) -> Result<String, StoreError> {
    sqlx::query(
        "INSERT INTO student_identifier (student_id, husid, allocated_year, allocated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (student_id) DO NOTHING",
    )
    .bind(student)
    .bind(husid)
    .bind(year.value())
    .bind(Timestamp::now().to_iso8601())
    .execute(pool)
    .await?;

    let stored: String =
        sqlx::query_scalar("SELECT husid FROM student_identifier WHERE student_id = ?1")
            .bind(student)
            .fetch_one(pool)
            .await?;
    Ok(stored)
}
