//! # Operational Row Types
//!
//! Read-only views of the records platform's tables, reduced to the
//! columns the return needs. Reference-data rows carry both the internal
//! id (which the legacy schema emits directly) and the newer coding where
//! the two diverge.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A reference-data value with its data-futures coding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coded {
    /// Internal id, emitted as-is by the legacy schema.
    pub id: i32,
    /// Code in the newer collection's vocabulary.
    pub data_futures_code: String,
}

/// Country of permanent residence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domicile {
    /// Internal id.
    pub id: i32,
    /// Regulator country code (e.g. `XF` for England).
    pub hesa_code: String,
    /// Whether the domicile is inside the UK.
    #[serde(default)]
    pub in_uk: bool,
}

impl Domicile {
    /// Internal id of the "not known" domicile.
    pub const NOT_KNOWN: i32 = 181;

    /// Whether the domicile was actually recorded.
    pub fn is_known(&self) -> bool {
        self.id != Self::NOT_KNOWN
    }
}

/// A person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    /// Id in the central student system, preferred over `id` where present.
    pub sits_id: Option<i64>,
    /// Previously allocated HUSID.
    pub husid: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub firstname: String,
    pub middlename: Option<String>,
    pub surname: String,
    /// Legacy SEXID code.
    pub sex: Option<String>,
    /// Recorded gender (`M`, `F`, `I`).
    pub gender: Option<String>,
    pub gender_identity: Option<i32>,
    pub sexual_orientation: Option<Coded>,
    pub religion_or_belief: Option<Coded>,
    pub ethnicity: Option<Coded>,
    pub parental_education: Option<Coded>,
    /// Legacy single disability code.
    pub disability: Option<i32>,
    /// Data-futures disability codes.
    #[serde(default)]
    pub disabilities: Vec<String>,
    /// Nationality country code.
    pub nationality: Option<String>,
    pub domicile: Option<Domicile>,
    pub termtime_postcode: Option<String>,
    pub termtime_accommodation: Option<i32>,
    /// Postcode of the default address.
    pub postcode: Option<String>,
    /// Student support number.
    pub ssn: Option<String>,
    #[serde(default)]
    pub home_fee_eligible: bool,
}

impl Student {
    /// The institution's own id for the person.
    pub fn own_id(&self) -> i64 {
        self.sits_id.unwrap_or(self.id)
    }

    /// Whether registration was left incomplete: no domicile *and* no gender.
    pub fn registration_incomplete(&self) -> bool {
        let no_domicile = self.domicile.as_ref().map_or(true, |d| !d.is_known());
        no_domicile && self.gender.is_none()
    }
}

/// A qualification type a programme leads to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Qualification {
    pub id: i32,
    /// Legacy COURSEAIM code.
    pub hesa_code: String,
    /// Data-futures QUALCAT code.
    pub data_futures_code: String,
    /// Ordinal level used for ELQ comparison.
    pub elq_rank: i32,
    pub on_hesa_return: bool,
    #[serde(default)]
    pub is_postgraduate: bool,
}

/// A subject and its share of a programme or module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectShare {
    /// HECoS subject code.
    pub subject: String,
    pub cost_centre: Option<i32>,
    pub percentage: i32,
}

/// A course of study.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Programme {
    pub id: i64,
    pub title: String,
    pub qualification: i32,
    pub study_mode: Option<i32>,
    pub funding_level: Option<i32>,
    pub funding_source: Option<i32>,
    pub reporting_year_type: Option<i32>,
    #[serde(default)]
    pub subjects: Vec<SubjectShare>,
}

/// A taught module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: i64,
    pub code: String,
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub credit_points: Option<i32>,
    pub full_time_equivalent: Decimal,
    pub points_level: Option<Coded>,
    #[serde(default)]
    pub is_cancelled: bool,
    #[serde(default)]
    pub subjects: Vec<SubjectShare>,
}

/// A prior qualification a person held on entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryQualification {
    /// Legacy QUALENT3 code (e.g. `M44`).
    pub id: String,
    pub data_futures_code: String,
    pub elq_rank: i32,
}

/// Where a person studies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyLocation {
    pub id: i32,
    pub hesa_code: String,
}

impl StudyLocation {
    /// Distance learning from outside the UK.
    pub const OVERSEAS: i32 = 9;
}

/// A person's registration on a programme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualificationAim {
    pub id: i64,
    pub student: i64,
    pub programme: i64,
    pub entry_qualification: Option<String>,
    pub study_location: i32,
}

/// An enrolment status (confirmed, withdrawn, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrolmentStatus {
    pub id: i32,
    pub on_hesa_return: bool,
}

/// A module result with its codes in each schema generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrolmentResult {
    pub id: String,
    /// Legacy MODOUT code.
    pub hesa_code: String,
    /// Data-futures MODULEOUTCOME code.
    pub data_futures_outcome: String,
}

/// One person on one module under one qualification aim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrolment {
    pub id: i64,
    pub qualification_aim: i64,
    pub module: i64,
    pub status: i32,
    pub result: String,
    pub points_awarded: Option<i32>,
}

/// Ledger account of a transaction line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Account {
    #[default]
    Debtor,
    Cash,
    Other,
}

/// A signed finance ledger line attached to an enrolment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerLine {
    pub enrolment: i64,
    pub amount: Decimal,
    pub transaction_type: i32,
    #[serde(default)]
    pub account: Account,
}

impl LedgerLine {
    /// Transaction type of course fees.
    pub const FEE_TRANSACTION: i32 = 1;

    /// Whether the line is a fee charged to (or credited back to) the student.
    pub fn is_fee_debt(&self) -> bool {
        self.transaction_type == Self::FEE_TRANSACTION && self.account == Account::Debtor
    }
}
