//! # Record Source
//!
//! The query interface the engine reads the operational store through,
//! and an in-memory implementation loaded from a snapshot file.
//!
//! Snapshots are JSON or YAML, chosen by file extension. Every table is
//! optional in the file and defaults to empty.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::models::{
    Enrolment, EnrolmentResult, EnrolmentStatus, EntryQualification, LedgerLine, Module,
    Programme, Qualification, QualificationAim, Student, StudyLocation,
};

/// Read access to the operational tables.
///
/// Lookups return `None` for unknown ids; deciding whether that is an error
/// belongs to the caller.
pub trait RecordSource {
    /// Every enrolment, in id order.
    fn enrolments(&self) -> &[Enrolment];
    fn student(&self, id: i64) -> Option<&Student>;
    fn qualification_aim(&self, id: i64) -> Option<&QualificationAim>;
    fn programme(&self, id: i64) -> Option<&Programme>;
    fn qualification(&self, id: i32) -> Option<&Qualification>;
    fn module(&self, id: i64) -> Option<&Module>;
    fn entry_qualification(&self, id: &str) -> Option<&EntryQualification>;
    fn study_location(&self, id: i32) -> Option<&StudyLocation>;
    fn enrolment_status(&self, id: i32) -> Option<&EnrolmentStatus>;
    fn enrolment_result(&self, id: &str) -> Option<&EnrolmentResult>;
    /// Fee ledger lines charged against an enrolment.
    fn fee_lines(&self, enrolment: i64) -> Vec<&LedgerLine>;
}

/// A serialized dump of the operational tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub students: Vec<Student>,
    pub qualifications: Vec<Qualification>,
    pub programmes: Vec<Programme>,
    pub modules: Vec<Module>,
    pub entry_qualifications: Vec<EntryQualification>,
    pub study_locations: Vec<StudyLocation>,
    pub qualification_aims: Vec<QualificationAim>,
    pub enrolment_statuses: Vec<EnrolmentStatus>,
    pub enrolment_results: Vec<EnrolmentResult>,
    pub enrolments: Vec<Enrolment>,
    pub ledger: Vec<LedgerLine>,
}

impl Snapshot {
    /// Load a snapshot from a `.json`, `.yaml` or `.yml` file.
    pub fn from_path(path: &Path) -> Result<Self, RecordError> {
        let content = std::fs::read_to_string(path)?;
        let parse_error = |reason: String| RecordError::Parse {
            path: path.display().to_string(),
            reason,
        };
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))
            }
            _ => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string())),
        }
    }
}

/// A [`RecordSource`] over an indexed snapshot.
#[derive(Debug, Default)]
pub struct InMemoryRecords {
    enrolments: Vec<Enrolment>,
    students: HashMap<i64, Student>,
    aims: HashMap<i64, QualificationAim>,
    programmes: HashMap<i64, Programme>,
    qualifications: HashMap<i32, Qualification>,
    modules: HashMap<i64, Module>,
    entry_qualifications: HashMap<String, EntryQualification>,
    study_locations: HashMap<i32, StudyLocation>,
    statuses: HashMap<i32, EnrolmentStatus>,
    results: HashMap<String, EnrolmentResult>,
    fees: HashMap<i64, Vec<LedgerLine>>,
}

impl InMemoryRecords {
    /// Index a snapshot, rejecting duplicate ids.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, RecordError> {
        let mut enrolments = snapshot.enrolments;
        enrolments.sort_by_key(|e| e.id);
        if let Some(pair) = enrolments.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(RecordError::Duplicate {
                entity: "enrolment",
                id: pair[0].id.to_string(),
            });
        }

        let mut fees: HashMap<i64, Vec<LedgerLine>> = HashMap::new();
        for line in snapshot.ledger.into_iter().filter(LedgerLine::is_fee_debt) {
            fees.entry(line.enrolment).or_default().push(line);
        }

        let records = Self {
            enrolments,
            students: index("student", snapshot.students, |s| s.id)?,
            aims: index("qualification aim", snapshot.qualification_aims, |a| a.id)?,
            programmes: index("programme", snapshot.programmes, |p| p.id)?,
            qualifications: index("qualification", snapshot.qualifications, |q| q.id)?,
            modules: index("module", snapshot.modules, |m| m.id)?,
            entry_qualifications: index("entry qualification", snapshot.entry_qualifications, |q| {
                q.id.clone()
            })?,
            study_locations: index("study location", snapshot.study_locations, |l| l.id)?,
            statuses: index("enrolment status", snapshot.enrolment_statuses, |s| s.id)?,
            results: index("enrolment result", snapshot.enrolment_results, |r| r.id.clone())?,
            fees,
        };
        tracing::debug!(
            enrolments = records.enrolments.len(),
            students = records.students.len(),
            "indexed record snapshot"
        );
        Ok(records)
    }

    /// Load and index a snapshot file.
    pub fn from_path(path: &Path) -> Result<Self, RecordError> {
        Self::from_snapshot(Snapshot::from_path(path)?)
    }
}

fn index<K, V>(
    entity: &'static str,
    rows: Vec<V>,
    key: impl Fn(&V) -> K,
) -> Result<HashMap<K, V>, RecordError>
where
    K: std::hash::Hash + Eq + std::fmt::Display,
{
    let mut map = HashMap::with_capacity(rows.len());
    for row in rows {
        let k = key(&row);
        if map.contains_key(&k) {
            return Err(RecordError::Duplicate {
                entity,
                id: k.to_string(),
            });
        }
        map.insert(k, row);
    }
    Ok(map)
}

impl RecordSource for InMemoryRecords {
    fn enrolments(&self) -> &[Enrolment] {
        &self.enrolments
    }

    fn student(&self, id: i64) -> Option<&Student> {
        self.students.get(&id)
    }

    fn qualification_aim(&self, id: i64) -> Option<&QualificationAim> {
        self.aims.get(&id)
    }

    fn programme(&self, id: i64) -> Option<&Programme> {
        self.programmes.get(&id)
    }

    fn qualification(&self, id: i32) -> Option<&Qualification> {
        self.qualifications.get(&id)
    }

    fn module(&self, id: i64) -> Option<&Module> {
        self.modules.get(&id)
    }

    fn entry_qualification(&self, id: &str) -> Option<&EntryQualification> {
        self.entry_qualifications.get(id)
    }

    fn study_location(&self, id: i32) -> Option<&StudyLocation> {
        self.study_locations.get(&id)
    }

    fn enrolment_status(&self, id: i32) -> Option<&EnrolmentStatus> {
        self.statuses.get(&id)
    }

    fn enrolment_result(&self, id: &str) -> Option<&EnrolmentResult> {
        self.results.get(id)
    }

    fn fee_lines(&self, enrolment: i64) -> Vec<&LedgerLine> {
        self.fees
            .get(&enrolment)
            .map(|lines| lines.iter().collect())
            .unwrap_or_default()
    }
}
