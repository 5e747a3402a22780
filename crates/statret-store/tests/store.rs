//! Batch persistence and the identifier counter against a scratch database.

use std::collections::{BTreeMap, HashSet};

use sqlx::SqlitePool;
use statret_core::{AcademicYear, BatchId, Generation, Timestamp};
use statret_staging::{legacy, SchemaDef, StagingTree};
use statret_state::BatchState;
use statret_store::{batches, identifiers, init_pool, sequence, BatchOutput, NewBatch, StoreError};

async fn pool(dir: &tempfile::TempDir) -> SqlitePool {
    let url = format!("sqlite://{}", dir.path().join("statret.db").display());
    init_pool(&url).await.unwrap()
}

fn year() -> AcademicYear {
    AcademicYear::new(2022).unwrap()
}

fn header() -> NewBatch {
    NewBatch {
        generation: Generation::Legacy,
        year: year(),
        ukprn: "10007774".to_string(),
        created_by: "registry".to_string(),
        created_at: Timestamp::now(),
    }
}

fn small_tree() -> StagingTree {
    let mut t = StagingTree::new(SchemaDef::for_generation(Generation::Legacy), "10007774");
    let inst = t.insert(legacy::INSTITUTION, "22051", None).unwrap();
    t.set(inst, "RECID", "22051").unwrap();
    let student = t.insert(legacy::STUDENT, "1", Some(inst)).unwrap();
    t.set(student, "HUSID", "2211560000016").unwrap();
    t.clear(inst, "INSTAPP").unwrap();
    t
}

// ── Batch lifecycle ──────────────────────────────────────────────────

#[tokio::test]
async fn test_populated_batch_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let pool = pool(&dir).await;

    let mut lifecycle = batches::insert_header(&pool, &header()).await.unwrap();
    let tree = small_tree();
    batches::commit_population(&pool, &mut lifecycle, &tree).await.unwrap();
    assert_eq!(lifecycle.state, BatchState::Populated);

    let record = batches::load(&pool, lifecycle.batch).await.unwrap().unwrap();
    assert_eq!(record.state(), BatchState::Populated);
    assert_eq!(record.generation, Generation::Legacy);
    assert_eq!(record.year, year());
    assert!(record.output.is_none());

    let restored = batches::load_tree(&pool, &record).await.unwrap();
    assert_eq!(restored.to_rows(), tree.to_rows());
}

#[tokio::test]
async fn test_failed_batch_keeps_reason_and_no_rows() {
    let dir = tempfile::tempdir().unwrap();
    let pool = pool(&dir).await;

    let mut lifecycle = batches::insert_header(&pool, &header()).await.unwrap();
    batches::mark_failed(&pool, &mut lifecycle, "source unavailable").await.unwrap();

    let record = batches::load(&pool, lifecycle.batch).await.unwrap().unwrap();
    assert_eq!(record.state(), BatchState::Failed);
    assert_eq!(record.failure_reason.as_deref(), Some("source unavailable"));
    assert!(batches::load_tree(&pool, &record).await.unwrap().is_empty());

    // A failed batch accepts nothing further.
    let err = batches::commit_population(&pool, &mut lifecycle, &small_tree())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::State(_)));
}

#[tokio::test]
async fn test_output_recorded_and_rewritable() {
    let dir = tempfile::tempdir().unwrap();
    let pool = pool(&dir).await;

    let mut lifecycle = batches::insert_header(&pool, &header()).await.unwrap();
    batches::commit_population(&pool, &mut lifecycle, &small_tree()).await.unwrap();

    let mut errors = BTreeMap::new();
    errors.insert("\"SID\" is a required property".to_string(), 3);
    let output = BatchOutput {
        filename: "conted_batch_1.xml".to_string(),
        errors,
        digest: "ab".repeat(32),
    };
    batches::record_output(&pool, &mut lifecycle, &output).await.unwrap();
    batches::record_output(&pool, &mut lifecycle, &output).await.unwrap();

    let record = batches::load(&pool, lifecycle.batch).await.unwrap().unwrap();
    assert_eq!(record.state(), BatchState::Complete);
    assert_eq!(record.output.as_ref(), Some(&output));
    assert_eq!(record.lifecycle.transitions.len(), 3);
}

#[tokio::test]
async fn test_output_before_population_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let pool = pool(&dir).await;

    let mut lifecycle = batches::insert_header(&pool, &header()).await.unwrap();
    let output = BatchOutput {
        filename: "x.xml".to_string(),
        errors: BTreeMap::new(),
        digest: String::new(),
    };
    assert!(batches::record_output(&pool, &mut lifecycle, &output).await.is_err());
    let record = batches::load(&pool, lifecycle.batch).await.unwrap().unwrap();
    assert_eq!(record.state(), BatchState::Populating);
}

#[tokio::test]
async fn test_list_newest_first_and_missing_batch() {
    let dir = tempfile::tempdir().unwrap();
    let pool = pool(&dir).await;

    let first = batches::insert_header(&pool, &header()).await.unwrap();
    let second = batches::insert_header(&pool, &header()).await.unwrap();
    let ids: Vec<BatchId> = batches::list(&pool)
        .await
        .unwrap()
        .iter()
        .map(|b| b.id())
        .collect();
    assert_eq!(ids, vec![second.batch, first.batch]);
    assert!(batches::load(&pool, BatchId(999)).await.unwrap().is_none());
}

// ── Sequence counter ─────────────────────────────────────────────────

#[tokio::test]
async fn test_sequence_starts_at_zero_and_is_per_year() {
    let dir = tempfile::tempdir().unwrap();
    let pool = pool(&dir).await;
    let other = AcademicYear::new(2023).unwrap();

    assert_eq!(sequence::peek(&pool, year()).await.unwrap(), 0);
    assert_eq!(sequence::next_value(&pool, year()).await.unwrap(), 0);
    assert_eq!(sequence::next_value(&pool, year()).await.unwrap(), 1);
    assert_eq!(sequence::next_value(&pool, other).await.unwrap(), 0);
    assert_eq!(sequence::peek(&pool, year()).await.unwrap(), 2);
}

#[tokio::test]
async fn test_sequence_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let pool = pool(&dir).await;
        for _ in 0..3 {
            sequence::next_value(&pool, year()).await.unwrap();
        }
        pool.close().await;
    }
    let pool = pool(&dir).await;
    assert_eq!(sequence::next_value(&pool, year()).await.unwrap(), 3);
}

#[tokio::test]
async fn test_concurrent_allocations_are_distinct() {
    let dir = tempfile::tempdir().unwrap();
    let pool = pool(&dir).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            let mut values = Vec::new();
            for _ in 0..10 {
                values.push(sequence::next_value(&pool, year()).await.unwrap());
            }
            values
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        for value in handle.await.unwrap() {
            assert!(seen.insert(value), "value {value} allocated twice");
        }
    }
    assert_eq!(seen.len(), 80);
    assert_eq!(seen.iter().max(), Some(&79));
}

// ── Allocated identifiers ────────────────────────────────────────────

#[tokio::test]
async fn test_identifiers_remembered() {
    let dir = tempfile::tempdir().unwrap();
    let pool = pool(&dir).await;

    let stored = identifiers::assign(&pool, 42, "2211560000016", year()).await.unwrap();
    assert_eq!(stored, "2211560000016");
    let found = identifiers::find_many(&pool, &[42, 43]).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found.get(&42).map(String::as_str), Some("2211560000016"));
}

#[tokio::test]
async fn test_second_assignment_keeps_first_identifier() {
    let dir = tempfile::tempdir().unwrap();
    let pool = pool(&dir).await;

    identifiers::assign(&pool, 42, "2211560000016", year()).await.unwrap();
    let stored = identifiers::assign(&pool, 42, "2211560000024", year()).await.unwrap();
    assert_eq!(stored, "2211560000016");

    let found = identifiers::find_many(&pool, &[42]).await.unwrap();
    assert_eq!(found.get(&42).map(String::as_str), Some("2211560000016"));
}
