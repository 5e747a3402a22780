//! # Natural-Key Generator
//!
//! Pure functions producing the external identifiers that appear in a
//! return. Internal surrogate ids are never emitted on their own; they are
//! always combined with the academic year or a fixed prefix so that the
//! same source row yields the same key every time it is derived.
//!
//! ## Checksum Identifiers
//!
//! Person identifiers supplied to the regulator are fixed-width decimal
//! strings:
//!
//! ```text
//! yy | institution digits | 6-digit sequence | check digit
//! ```
//!
//! The check digit is `(10 − Σ dᵢ·wᵢ) mod 10`, with weights cycling
//! `1, 3, 7, 9` over every preceding digit. A 4-digit institution code gives
//! the 13-digit legacy HUSID. The 8-digit UKPRN gives the 17-digit SID.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::identity::AcademicYear;

/// Weight cycle of the published check-digit algorithm.
const CHECK_WEIGHTS: [u32; 4] = [1, 3, 7, 9];

/// Width of the zero-padded per-year sequence component.
pub const SEQUENCE_WIDTH: usize = 6;

/// Largest sequence value that fits the sequence component.
pub const MAX_SEQUENCE: u32 = 999_999;

/// Compute the check digit over a string of ASCII digits.
///
/// Returns `None` if `digits` contains anything other than `0-9`.
pub fn checksum_digit(digits: &str) -> Option<u32> {
    let mut sum = 0u32;
    for (c, weight) in digits.chars().zip(CHECK_WEIGHTS.iter().cycle()) {
        sum += c.to_digit(10)? * weight;
    }
    Some((10 - sum % 10) % 10)
}

/// Generator for one institution's checksum identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumKey {
    institution: String,
}

impl ChecksumKey {
    /// A generator for the given institution digits (e.g. `"1156"` or a UKPRN).
    pub fn new(institution: impl Into<String>) -> Result<Self, CoreError> {
        let institution = institution.into();
        if institution.is_empty() || !institution.chars().all(|c| c.is_ascii_digit()) {
            return Err(CoreError::InvalidKeyComponent {
                component: "institution",
                reason: format!("expected ASCII digits, got {institution:?}"),
            });
        }
        Ok(Self { institution })
    }

    /// The institution digits.
    pub fn institution(&self) -> &str {
        &self.institution
    }

    /// Total width of generated identifiers, check digit included.
    pub fn width(&self) -> usize {
        2 + self.institution.len() + SEQUENCE_WIDTH + 1
    }

    /// Produce the identifier for `sequence` in `year`.
    pub fn generate(&self, year: AcademicYear, sequence: u32) -> Result<String, CoreError> {
        if sequence > MAX_SEQUENCE {
            return Err(CoreError::InvalidKeyComponent {
                component: "sequence",
                reason: format!("{sequence} exceeds {MAX_SEQUENCE}"),
            });
        }
        let head = format!(
            "{}{}{:0width$}",
            year.two_digits(),
            self.institution,
            sequence,
            width = SEQUENCE_WIDTH
        );
        // head is all digits by construction
        let check = checksum_digit(&head).unwrap_or(0);
        Ok(format!("{head}{check}"))
    }

    /// Whether `candidate` has this generator's width and a valid check digit.
    pub fn verify(&self, candidate: &str) -> bool {
        if candidate.len() != self.width() || !candidate.is_ascii() {
            return false;
        }
        let (head, tail) = candidate.split_at(candidate.len() - 1);
        match (checksum_digit(head), tail.chars().next().and_then(|c| c.to_digit(10))) {
            (Some(expected), Some(actual)) => expected == actual,
            _ => false,
        }
    }
}

// ─── Composite Keys ──────────────────────────────────────────────────

/// Engagement / instance key: `{id}-{year}`, unique within a year.
pub fn engagement_key(qualification_aim: impl Display, year: AcademicYear) -> String {
    format!("{qualification_aim}-{year}")
}

/// Reusable qualification key for a programme.
pub fn qualification_key(programme: impl Display) -> String {
    format!("qual-{programme}")
}

/// Student course session key for an engagement.
pub fn course_session_key(engagement: &str) -> String {
    format!("scs-{engagement}")
}

/// Qualification award key for an engagement.
pub fn award_key(engagement: &str) -> String {
    format!("qual-award-{engagement}")
}

/// Study location key for an engagement.
pub fn study_location_key(engagement: &str) -> String {
    format!("study-location-{engagement}")
}

/// Legacy institution record id: two-digit year followed by the return code.
pub fn legacy_record_id(year: AcademicYear) -> String {
    format!("{}051", year.two_digits())
}
