//! # Return Service
//!
//! Orchestrates one run of the return:
//!
//! 1. Insert the batch header (`Populating`).
//! 2. Select the population once, and allocate person identifiers for
//!    anyone selected without one.
//! 3. Populate and post-process the staging tree in memory.
//! 4. Commit the tree and the `Populated` transition in one transaction.
//!    Any failure in steps 2–4 marks the batch `Failed` with no rows.
//! 5. Serialize, validate (data futures, when a schema is configured),
//!    store the document, and record filename, errors and digest.
//!
//! Step 5 is also available on its own as [`ReturnService::write`], so a
//! populated batch can be re-serialized without rebuilding it.

use std::collections::HashMap;
use std::path::PathBuf;

use sqlx::SqlitePool;
use statret_core::{AcademicYear, BatchId, ChecksumKey, Generation, ReportingWindow, Timestamp};
use statret_records::{RecordSource, Selection};
use statret_schema::{validate_with, ValidationReport};
use statret_state::BatchLifecycle;
use statret_store::{
    batches, identifiers, init_pool, sequence, sha256_hex, BatchOutput, BatchRecord, ContentStore,
    NewBatch,
};
use statret_xml::{build_document, encode};

use crate::config::ReturnConfig;
use crate::error::EngineError;
use crate::populate::{populate, Population, PopulationOptions};
use crate::post_process::post_process;
use crate::progress::ProgressSink;

/// A stored return document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReturn {
    pub batch: BatchId,
    pub path: PathBuf,
    pub output: BatchOutput,
}

/// Runs returns against one database and content store.
#[derive(Debug, Clone)]
pub struct ReturnService {
    pool: SqlitePool,
    config: ReturnConfig,
    content: ContentStore,
}

impl ReturnService {
    pub fn new(pool: SqlitePool, config: ReturnConfig) -> Self {
        let content = ContentStore::new(config.media_root.clone());
        Self {
            pool,
            config,
            content,
        }
    }

    /// Open the configured database, running migrations.
    pub async fn connect(config: ReturnConfig) -> Result<Self, EngineError> {
        let pool = init_pool(&config.database_url).await?;
        Ok(Self::new(pool, config))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &ReturnConfig {
        &self.config
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    /// Build a new batch for `year` and write its document.
    pub async fn create<S>(
        &self,
        year: AcademicYear,
        generation: Generation,
        created_by: &str,
        source: &S,
        progress: &dyn ProgressSink,
    ) -> Result<WrittenReturn, EngineError>
    where
        S: RecordSource + Sync + ?Sized,
    {
        let header = NewBatch {
            generation,
            year,
            ukprn: self.config.ukprn.clone(),
            created_by: created_by.to_string(),
            created_at: Timestamp::now(),
        };
        let mut lifecycle = batches::insert_header(&self.pool, &header).await?;
        metrics::counter!("statret_batches_created_total", "generation" => generation.as_str())
            .increment(1);
        tracing::info!(
            batch = %lifecycle.batch,
            year = %year,
            generation = generation.as_str(),
            created_by,
            "batch created"
        );

        if let Err(e) = self
            .build_and_commit(&mut lifecycle, generation, year, source, progress)
            .await
        {
            tracing::error!(batch = %lifecycle.batch, error = %e, "population failed");
            metrics::counter!("statret_batches_failed_total", "generation" => generation.as_str())
                .increment(1);
            if let Err(mark) = batches::mark_failed(&self.pool, &mut lifecycle, &e.to_string()).await {
                tracing::error!(batch = %lifecycle.batch, error = %mark, "could not mark batch failed");
            }
            return Err(e);
        }

        self.write(lifecycle.batch).await
    }

    async fn build_and_commit<S>(
        &self,
        lifecycle: &mut BatchLifecycle,
        generation: Generation,
        year: AcademicYear,
        source: &S,
        progress: &dyn ProgressSink,
    ) -> Result<(), EngineError>
    where
        S: RecordSource + Sync + ?Sized,
    {
        let selection = Selection::build(source, ReportingWindow::for_year(year))?;
        let identifiers = self.allocate_identifiers(&selection).await?;
        let options = PopulationOptions::from(&self.config);

        let mut tree = populate(
            generation,
            Population {
                selection: &selection,
                options: &options,
                identifiers: &identifiers,
            },
            progress,
        )?;
        post_process(&mut tree)?;

        batches::commit_population(&self.pool, lifecycle, &tree).await?;
        metrics::counter!("statret_staging_records_total", "generation" => generation.as_str())
            .increment(tree.len() as u64);
        for (kind, count) in tree.counts() {
            tracing::debug!(batch = %lifecycle.batch, kind, count, "staging records");
        }
        Ok(())
    }

    /// HUSID for every selected student: the one on record, one allocated
    /// by an earlier batch, or a fresh allocation.
    pub async fn allocate_identifiers(
        &self,
        selection: &Selection<'_>,
    ) -> Result<HashMap<i64, String>, EngineError> {
        let year = selection.window().year;
        let mut found = HashMap::new();
        let mut missing = Vec::new();
        for selected in selection.students() {
            match selected.student.husid.as_deref().map(str::trim) {
                Some(husid) if !husid.is_empty() => {
                    found.insert(selected.student.id, husid.to_string());
                }
                _ => missing.push(selected.student.id),
            }
        }
        if missing.is_empty() {
            return Ok(found);
        }

        let stored = identifiers::find_many(&self.pool, &missing).await?;
        let key = self.config.husid_key()?;
        let mut allocated = 0u64;
        for student in missing {
            if let Some(husid) = stored.get(&student) {
                found.insert(student, husid.clone());
                continue;
            }
            let candidate = self.next_identifier(&key, year).await?;
            let husid = identifiers::assign(&self.pool, student, &candidate, year).await?;
            if husid == candidate {
                tracing::debug!(student, husid = %husid, "person identifier allocated");
                allocated += 1;
            } else {
                tracing::debug!(
                    student,
                    husid = %husid,
                    discarded = %candidate,
                    "person identifier already allocated by an overlapping run"
                );
            }
            found.insert(student, husid);
        }
        if allocated > 0 {
            metrics::counter!("statret_identifiers_allocated_total").increment(allocated);
            tracing::info!(year = %year, allocated, "person identifiers allocated");
        }
        Ok(found)
    }

    /// Allocate the next checksum identifier for `year`.
    pub async fn next_identifier(
        &self,
        key: &ChecksumKey,
        year: AcademicYear,
    ) -> Result<String, EngineError> {
        let value = sequence::next_value(&self.pool, year).await?;
        let seq = u32::try_from(value).map_err(|_| EngineError::SequenceExhausted { value })?;
        Ok(key.generate(year, seq)?)
    }

    /// Serialize a populated batch, store the document and record the
    /// result. May be repeated; each call replaces the stored document.
    pub async fn write(&self, batch: BatchId) -> Result<WrittenReturn, EngineError> {
        let record = batches::load(&self.pool, batch)
            .await?
            .ok_or(EngineError::BatchNotFound(batch))?;
        if !record.state().is_serializable() {
            return Err(EngineError::NotPopulated {
                batch,
                state: record.state(),
            });
        }

        let tree = batches::load_tree(&self.pool, &record).await?;
        let document = build_document(&tree);
        let bytes = encode(&document)?;

        let report = match (record.generation, &self.config.schema) {
            (Generation::DataFutures, Some(source)) => validate_with(source, &bytes).await,
            _ => ValidationReport::default(),
        };
        if !report.is_clean() {
            metrics::counter!("statret_validation_errors_total").increment(report.total() as u64);
        }

        let filename = record
            .generation
            .filename(&self.config.file_prefix, batch);
        let path = self
            .content
            .write(record.generation.subsystem(), &filename, &bytes)
            .await?;
        let output = BatchOutput {
            filename,
            errors: report.into_counts(),
            digest: sha256_hex(&bytes),
        };

        let mut lifecycle = record.lifecycle;
        batches::record_output(&self.pool, &mut lifecycle, &output).await?;
        tracing::info!(
            batch = %batch,
            filename = %output.filename,
            errors = output.errors.values().sum::<usize>(),
            "return written"
        );
        Ok(WrittenReturn {
            batch,
            path,
            output,
        })
    }

    pub async fn load(&self, batch: BatchId) -> Result<Option<BatchRecord>, EngineError> {
        Ok(batches::load(&self.pool, batch).await?)
    }

    /// Every batch, newest first.
    pub async fn list(&self) -> Result<Vec<BatchRecord>, EngineError> {
        Ok(batches::list(&self.pool).await?)
    }
}
