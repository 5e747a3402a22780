//! Batch persistence operations.
//!
//! A batch header is written before population starts. Its staging rows
//! and the `Populated` transition are committed together in one
//! transaction, so no consumer ever sees a half-populated batch.

use std::collections::BTreeMap;

use sqlx::{Sqlite, SqlitePool, Transaction};

use statret_core::{AcademicYear, BatchId, Generation, Timestamp};
use statret_staging::{SchemaDef, StagingRow, StagingTree};
use statret_state::{BatchLifecycle, BatchState, BatchTransitionRecord};

use crate::error::StoreError;

/// Header of a batch about to be populated.
#[derive(Debug, Clone)]
pub struct NewBatch {
    pub generation: Generation,
    pub year: AcademicYear,
    pub ukprn: String,
    pub created_by: String,
    pub created_at: Timestamp,
}

/// What writing a document produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutput {
    pub filename: String,
    /// Validation message to occurrence count.
    pub errors: BTreeMap<String, usize>,
    /// SHA-256 of the document bytes, lowercase hex.
    pub digest: String,
}

/// A stored batch.
#[derive(Debug, Clone)]
pub struct BatchRecord {
    pub generation: Generation,
    pub year: AcademicYear,
    pub ukprn: String,
    pub created_by: String,
    pub lifecycle: BatchLifecycle,
    pub output: Option<BatchOutput>,
    pub failure_reason: Option<String>,
}

impl BatchRecord {
    pub fn id(&self) -> BatchId {
        self.lifecycle.batch
    }

    pub fn state(&self) -> BatchState {
        self.lifecycle.state
    }
}

/// Insert a batch header in the Populating state.
pub async fn insert_header(pool: &SqlitePool, batch: &NewBatch) -> Result<BatchLifecycle, StoreError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO batch (generation, academic_year, ukprn, created_at, created_by, state)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         RETURNING id",
    )
    .bind(batch.generation.as_str())
    .bind(batch.year.value())
    .bind(&batch.ukprn)
    .bind(batch.created_at.to_iso8601())
    .bind(&batch.created_by)
    .bind(BatchState::Populating.as_str())
    .fetch_one(pool)
    .await?;

    tracing::debug!(batch = id, year = %batch.year, generation = %batch.generation, "batch header inserted");
    Ok(BatchLifecycle::new(BatchId(id), batch.created_at))
}

/// Persist a populated tree and move the batch to Populated, atomically.
pub async fn commit_population(
    pool: &SqlitePool,
    lifecycle: &mut BatchLifecycle,
    tree: &StagingTree,
) -> Result<(), StoreError> {
    let mut next = lifecycle.clone();
    let record = next
        .mark_populated(&format!("{} staging records", tree.len()))?
        .clone();
    let seq = next.transitions.len() - 1;

    let mut tx = pool.begin().await?;
    for row in tree.to_rows() {
        insert_row(&mut tx, lifecycle.batch, &row).await?;
    }
    insert_transition(&mut tx, lifecycle.batch, seq, &record).await?;
    sqlx::query("UPDATE batch SET state = ?1 WHERE id = ?2")
        .bind(record.to_state.as_str())
        .bind(lifecycle.batch.get())
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    *lifecycle = next;
    Ok(())
}

/// Record that population failed. No staging rows are written.
pub async fn mark_failed(
    pool: &SqlitePool,
    lifecycle: &mut BatchLifecycle,
    reason: &str,
) -> Result<(), StoreError> {
    let mut next = lifecycle.clone();
    let record = next.mark_failed(reason)?.clone();
    let seq = next.transitions.len() - 1;

    let mut tx = pool.begin().await?;
    insert_transition(&mut tx, lifecycle.batch, seq, &record).await?;
    sqlx::query("UPDATE batch SET state = ?1, failure_reason = ?2 WHERE id = ?3")
        .bind(record.to_state.as_str())
        .bind(reason)
        .bind(lifecycle.batch.get())
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    *lifecycle = next;
    Ok(())
}

/// Record a written document and move the batch to Complete.
pub async fn record_output(
    pool: &SqlitePool,
    lifecycle: &mut BatchLifecycle,
    output: &BatchOutput,
) -> Result<(), StoreError> {
    let mut next = lifecycle.clone();
    let record = next.mark_complete(&output.filename)?.clone();
    let seq = next.transitions.len() - 1;
    let errors = serde_json::to_string(&output.errors).map_err(|e| StoreError::Corrupt {
        batch: lifecycle.batch,
        column: "errors",
        reason: e.to_string(),
    })?;

    let mut tx = pool.begin().await?;
    insert_transition(&mut tx, lifecycle.batch, seq, &record).await?;
    sqlx::query(
        "UPDATE batch SET state = ?1, filename = ?2, errors = ?3, digest = ?4 WHERE id = ?5",
    )
    .bind(record.to_state.as_str())
    .bind(&output.filename)
    .bind(errors)
    .bind(&output.digest)
    .bind(lifecycle.batch.get())
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    *lifecycle = next;
    Ok(())
}

/// Fetch a batch by id.
pub async fn load(pool: &SqlitePool, id: BatchId) -> Result<Option<BatchRecord>, StoreError> {
    let row = sqlx::query_as::<_, BatchRow>(
        "SELECT id, generation, academic_year, ukprn, created_at, created_by,
         filename, errors, digest, failure_reason
         FROM batch WHERE id = ?1",
    )
    .bind(id.get())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let transitions = load_transitions(pool, id).await?;
            Ok(Some(row.into_record(transitions)?))
        }
        None => Ok(None),
    }
}

/// All batches, newest first.
pub async fn list(pool: &SqlitePool) -> Result<Vec<BatchRecord>, StoreError> {
    let rows = sqlx::query_as::<_, BatchRow>(
        "SELECT id, generation, academic_year, ukprn, created_at, created_by,
         filename, errors, digest, failure_reason
         FROM batch ORDER BY id DESC",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let transitions = load_transitions(pool, BatchId(row.id)).await?;
        records.push(row.into_record(transitions)?);
    }
    Ok(records)
}

/// Rebuild a batch's staging tree.
pub async fn load_tree(pool: &SqlitePool, batch: &BatchRecord) -> Result<StagingTree, StoreError> {
    let rows = sqlx::query_as::<_, StagingRecordRow>(
        "SELECT record_id, kind, natural_key, parent_id, fields
         FROM staging_record WHERE batch_id = ?1 ORDER BY record_id",
    )
    .bind(batch.id().get())
    .fetch_all(pool)
    .await?;

    let rows = rows
        .into_iter()
        .map(|r| r.into_row(batch.id()))
        .collect::<Result<Vec<_>, _>>()?;
    let tree = StagingTree::from_rows(
        SchemaDef::for_generation(batch.generation),
        batch.ukprn.clone(),
        rows,
    )?;
    Ok(tree)
}

async fn insert_row(
    tx: &mut Transaction<'_, Sqlite>,
    batch: BatchId,
    row: &StagingRow,
) -> Result<(), StoreError> {
    let fields = serde_json::to_string(&row.fields).map_err(|e| StoreError::Corrupt {
        batch,
        column: "fields",
        reason: e.to_string(),
    })?;
    sqlx::query(
        "INSERT INTO staging_record (batch_id, record_id, kind, natural_key, parent_id, fields)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(batch.get())
    .bind(row.id as i64)
    .bind(&row.kind)
    .bind(&row.key)
    .bind(row.parent.map(|p| p as i64))
    .bind(fields)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_transition(
    tx: &mut Transaction<'_, Sqlite>,
    batch: BatchId,
    seq: usize,
    record: &BatchTransitionRecord,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO batch_transition (batch_id, seq, from_state, to_state, occurred_at, reason)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(batch.get())
    .bind(seq as i64)
    .bind(record.from_state.as_str())
    .bind(record.to_state.as_str())
    .bind(record.timestamp.to_iso8601())
    .bind(&record.reason)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn load_transitions(
    pool: &SqlitePool,
    batch: BatchId,
) -> Result<Vec<BatchTransitionRecord>, StoreError> {
    let rows = sqlx::query_as::<_, TransitionRow>(
        "SELECT from_state, to_state, occurred_at, reason
         FROM batch_transition WHERE batch_id = ?1 ORDER BY seq",
    )
    .bind(batch.get())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(|r| r.into_record(batch)).collect()
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct BatchRow {
    id: i64,
    generation: String,
    academic_year: i32,
    ukprn: String,
    created_at: String,
    created_by: String,
    filename: Option<String>,
    errors: Option<String>,
    digest: Option<String>,
    failure_reason: Option<String>,
}

impl BatchRow {
    fn into_record(self, transitions: Vec<BatchTransitionRecord>) -> Result<BatchRecord, StoreError> {
        let batch = BatchId(self.id);
        let corrupt = |column: &'static str, reason: String| StoreError::Corrupt {
            batch,
            column,
            reason,
        };

        let generation = self
            .generation
            .parse::<Generation>()
            .map_err(|e| corrupt("generation", e.to_string()))?;
        let year = AcademicYear::new(self.academic_year)
            .map_err(|e| corrupt("academic_year", e.to_string()))?;
        let created_at = Timestamp::parse(&self.created_at)
            .map_err(|e| corrupt("created_at", e.to_string()))?;
        let lifecycle = BatchLifecycle::restore(batch, created_at, transitions)?;

        let output = match (self.filename, self.digest) {
            (Some(filename), Some(digest)) => {
                let errors = match self.errors {
                    Some(json) => serde_json::from_str(&json)
                        .map_err(|e| corrupt("errors", e.to_string()))?,
                    None => BTreeMap::new(),
                };
                Some(BatchOutput {
                    filename,
                    errors,
                    digest,
                })
            }
            _ => None,
        };

        Ok(BatchRecord {
            generation,
            year,
            ukprn: self.ukprn,
            created_by: self.created_by,
            lifecycle,
            output,
            failure_reason: self.failure_reason,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TransitionRow {
    from_state: String,
    to_state: String,
    occurred_at: String,
    reason: String,
}

impl TransitionRow {
    fn into_record(self, batch: BatchId) -> Result<BatchTransitionRecord, StoreError> {
        Ok(BatchTransitionRecord {
            from_state: self.from_state.parse()?,
            to_state: self.to_state.parse()?,
            timestamp: Timestamp::parse(&self.occurred_at).map_err(|e| StoreError::Corrupt {
                batch,
                column: "batch_transition.occurred_at",
                reason: e.to_string(),
            })?,
            reason: self.reason,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StagingRecordRow {
    record_id: i64,
    kind: String,
    natural_key: String,
    parent_id: Option<i64>,
    fields: String,
}

impl StagingRecordRow {
    fn into_row(self, batch: BatchId) -> Result<StagingRow, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt {
            batch,
            column: "staging_record",
            reason,
        };
        let id = usize::try_from(self.record_id).map_err(|e| corrupt(e.to_string()))?;
        let parent = self
            .parent_id
            .map(usize::try_from)
            .transpose()
            .map_err(|e| corrupt(e.to_string()))?;
        let fields = serde_json::from_str(&self.fields).map_err(|e| corrupt(e.to_string()))?;
        Ok(StagingRow {
            id,
            kind: self.kind,
            key: self.natural_key,
            parent,
            fields,
        })
    }
}
