//! # Population
//!
//! Turns a [`Selection`] into a staging tree. Each generation has its own
//! builder with a fixed list of phases: reference entities (institution,
//! courses, modules) first, then per-person detail. Every phase walks the
//! same selection, so all of them agree on who is in the return.
//!
//! Population is synchronous and pure over its inputs. It never touches
//! the database; the caller commits the finished tree in one transaction,
//! so a failure in any phase leaves nothing behind.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use statret_core::Generation;
use statret_records::{SelectedEnrolment, Selection, Student};
use statret_rules::outcomes::EndingFallback;
use statret_staging::StagingTree;

use crate::config::{ReturnConfig, Venue};
use crate::error::EngineError;
use crate::progress::ProgressSink;
use crate::{data_futures, legacy};

/// Settings the builders read.
#[derive(Debug, Clone)]
pub struct PopulationOptions {
    pub ukprn: String,
    pub ending_fallback: EndingFallback,
    pub venue: Venue,
}

impl From<&ReturnConfig> for PopulationOptions {
    fn from(config: &ReturnConfig) -> Self {
        Self {
            ukprn: config.ukprn.clone(),
            ending_fallback: config.ending_fallback,
            venue: config.venue.clone(),
        }
    }
}

/// Everything a builder reads.
#[derive(Debug, Clone, Copy)]
pub struct Population<'p> {
    pub selection: &'p Selection<'p>,
    pub options: &'p PopulationOptions,
    /// Person identifier (HUSID) per student id, stored or allocated.
    pub identifiers: &'p HashMap<i64, String>,
}

impl<'p> Population<'p> {
    /// The person identifier of a selected student.
    pub(crate) fn identifier(&self, student: &Student) -> Result<&'p str, EngineError> {
        self.identifiers
            .get(&student.id)
            .map(String::as_str)
            .ok_or(EngineError::MissingIdentifier {
                student: student.id,
            })
    }
}

/// Build the staging tree of `generation`.
pub fn populate(
    generation: Generation,
    population: Population<'_>,
    progress: &dyn ProgressSink,
) -> Result<StagingTree, EngineError> {
    let tree = match generation {
        Generation::Legacy => legacy::populate(population, progress)?,
        Generation::DataFutures => data_futures::populate(population, progress)?,
    };
    tracing::info!(
        generation = generation.as_str(),
        records = tree.len(),
        "staging tree populated"
    );
    Ok(tree)
}

// ─── Phase Runner ────────────────────────────────────────────────────

pub(crate) type Phase<B> = (&'static str, fn(&mut B) -> Result<(), EngineError>);

pub(crate) trait Builder {
    fn tree(&self) -> &StagingTree;
}

pub(crate) fn run_phases<B: Builder>(
    builder: &mut B,
    phases: &[Phase<B>],
    progress: &dyn ProgressSink,
) -> Result<(), EngineError> {
    let total = phases.len();
    for (index, (label, run)) in phases.iter().enumerate() {
        progress.phase(index + 1, total, label);
        let before = builder.tree().len();
        run(builder)?;
        tracing::debug!(
            phase = *label,
            added = builder.tree().len() - before,
            "phase complete"
        );
    }
    Ok(())
}

// ─── Aggregates ──────────────────────────────────────────────────────

/// Earliest module start among `enrolments`.
pub(crate) fn earliest_start(enrolments: &[SelectedEnrolment<'_>]) -> Option<NaiveDate> {
    enrolments.iter().filter_map(|e| e.module.start_date).min()
}

/// Total working-time equivalent of `enrolments`.
pub(crate) fn total_fte(enrolments: &[SelectedEnrolment<'_>]) -> Decimal {
    enrolments
        .iter()
        .map(|e| e.module.full_time_equivalent)
        .sum::<Decimal>()
        .normalize()
}

/// Fee lines of every enrolment.
pub(crate) fn all_fees<'e, 'a>(
    enrolments: &'e [SelectedEnrolment<'a>],
) -> impl Iterator<Item = &'a statret_records::LedgerLine> + 'e {
    enrolments.iter().flat_map(|e| e.fees.iter().copied())
}

pub(crate) fn int(value: Option<i32>) -> Option<i64> {
    value.map(i64::from)
}
