//! # Outcome Precedence Tables
//!
//! Several coded values summarise *all* of a person's enrolments within an
//! engagement: the reason the engagement ended and whether the funded
//! activity was completed. Each is a first-match table over the set of
//! outcome codes seen across those enrolments.
//!
//! Rules are checked in table order and the first one whose condition holds
//! wins. The order among the *other* enrolments never matters, only which
//! categories are present.
//!
//! ## Tables
//!
//! ```text
//! legacy RSNEND      "1" → 01 | "2" → 02 | fallback (configurable)
//! legacy FUNDCOMP    "4" → 2  | "6" → 3  | {1,2,C} → 1 | fallback 3
//! data-futures       credit awarded → 01 | "05" → 98 | fallback 11
//!   RSNENGEND
//! data-futures       "03" → 02 | "05" → 03 | "01" → 01 | fallback 03
//!   FUNDCOMP
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use statret_records::SelectedEnrolment;
use thiserror::Error;

// ─── Outcome Sets ────────────────────────────────────────────────────

/// The outcome codes seen across one engagement's enrolments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeSet {
    codes: BTreeSet<String>,
    credit_awarded: bool,
}

impl OutcomeSet {
    /// Build from raw codes and a flag for "any credit awarded".
    pub fn new<I, S>(codes: I, credit_awarded: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
            credit_awarded,
        }
    }

    /// Legacy MODOUT codes of the given enrolments.
    pub fn legacy(enrolments: &[SelectedEnrolment<'_>]) -> Self {
        Self::new(
            enrolments.iter().map(|e| e.result.hesa_code.as_str()),
            credit_awarded(enrolments),
        )
    }

    /// Data-futures MODULEOUTCOME codes of the given enrolments.
    pub fn data_futures(enrolments: &[SelectedEnrolment<'_>]) -> Self {
        Self::new(
            enrolments.iter().map(|e| e.result.data_futures_outcome.as_str()),
            credit_awarded(enrolments),
        )
    }

    /// Whether `code` was seen.
    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    /// Whether any enrolment was awarded credit points.
    pub fn credit_awarded(&self) -> bool {
        self.credit_awarded
    }
}

fn credit_awarded(enrolments: &[SelectedEnrolment<'_>]) -> bool {
    enrolments
        .iter()
        .map(|e| i64::from(e.enrolment.points_awarded.unwrap_or(0)))
        .sum::<i64>()
        > 0
}

// ─── Tables ──────────────────────────────────────────────────────────

/// When a precedence rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Any of the listed outcome codes is present.
    AnyOutcome(&'static [&'static str]),
    /// Any enrolment was awarded credit points.
    AnyCredit,
}

impl Condition {
    fn holds(&self, outcomes: &OutcomeSet) -> bool {
        match self {
            Self::AnyOutcome(codes) => codes.iter().any(|c| outcomes.contains(c)),
            Self::AnyCredit => outcomes.credit_awarded(),
        }
    }
}

/// One row of a precedence table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrecedenceRule {
    pub when: Condition,
    pub code: &'static str,
}

/// A derived code, and whether a rule matched or the fallback was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Derived {
    pub code: &'static str,
    pub matched: bool,
}

/// Apply `table` to `outcomes`, returning `fallback` if no rule fires.
pub fn first_match(
    table: &[PrecedenceRule],
    outcomes: &OutcomeSet,
    fallback: &'static str,
) -> Derived {
    table
        .iter()
        .find(|rule| rule.when.holds(outcomes))
        .map(|rule| Derived {
            code: rule.code,
            matched: true,
        })
        .unwrap_or(Derived {
            code: fallback,
            matched: false,
        })
}

pub const LEGACY_RSNEND: &[PrecedenceRule] = &[
    PrecedenceRule {
        when: Condition::AnyOutcome(&["1"]),
        code: "01",
    },
    PrecedenceRule {
        when: Condition::AnyOutcome(&["2"]),
        code: "02",
    },
];

pub const LEGACY_FUNDCOMP: &[PrecedenceRule] = &[
    PrecedenceRule {
        when: Condition::AnyOutcome(&["4"]),
        code: "2",
    },
    PrecedenceRule {
        when: Condition::AnyOutcome(&["6"]),
        code: "3",
    },
    PrecedenceRule {
        when: Condition::AnyOutcome(&["1", "2", "C"]),
        code: "1",
    },
];

pub const DATA_FUTURES_RSNENGEND: &[PrecedenceRule] = &[
    PrecedenceRule {
        when: Condition::AnyCredit,
        code: "01",
    },
    PrecedenceRule {
        when: Condition::AnyOutcome(&["05"]),
        code: "98",
    },
];

pub const DATA_FUTURES_FUNDCOMP: &[PrecedenceRule] = &[
    PrecedenceRule {
        when: Condition::AnyOutcome(&["03"]),
        code: "02",
    },
    PrecedenceRule {
        when: Condition::AnyOutcome(&["05"]),
        code: "03",
    },
    PrecedenceRule {
        when: Condition::AnyOutcome(&["01"]),
        code: "01",
    },
];

/// Legacy RSNEND for "completed".
pub const COMPLETED: &str = "01";
/// Data-futures RSNENGEND for "awarded credit".
pub const AWARDED_CREDIT: &str = "01";

// ─── Ending Fallback ─────────────────────────────────────────────────

/// What legacy RSNEND reports when no outcome matches a known category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndingFallback {
    /// Treat unmatched outcomes as completion (`01`).
    #[default]
    Completed,
    /// Report the reason as not known (`98`).
    Unknown,
}

impl EndingFallback {
    /// The RSNEND code used on fallback.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Completed => "01",
            Self::Unknown => "98",
        }
    }
}

impl std::fmt::Display for EndingFallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// An unrecognised ending-fallback name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown ending fallback {0:?} (expected \"completed\" or \"unknown\")")]
pub struct UnknownFallback(pub String);

impl std::str::FromStr for EndingFallback {
    type Err = UnknownFallback;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "completed" => Ok(Self::Completed),
            "unknown" => Ok(Self::Unknown),
            _ => Err(UnknownFallback(s.to_string())),
        }
    }
}

// ─── Derivations ─────────────────────────────────────────────────────

/// Legacy reason for ending.
pub fn legacy_reason_for_ending(outcomes: &OutcomeSet, fallback: EndingFallback) -> Derived {
    first_match(LEGACY_RSNEND, outcomes, fallback.code())
}

/// Legacy funding completion.
pub fn legacy_completion(outcomes: &OutcomeSet) -> Derived {
    first_match(LEGACY_FUNDCOMP, outcomes, "3")
}

/// Data-futures reason for engagement ending.
pub fn data_futures_reason_for_ending(outcomes: &OutcomeSet) -> Derived {
    first_match(DATA_FUTURES_RSNENGEND, outcomes, "11")
}

/// Data-futures funding completion.
pub fn data_futures_completion(outcomes: &OutcomeSet) -> Derived {
    first_match(DATA_FUTURES_FUNDCOMP, outcomes, "03")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(codes: &[&str]) -> OutcomeSet {
        OutcomeSet::new(codes.iter().copied(), false)
    }

    // ── Legacy ───────────────────────────────────────────────────────

    #[test]
    fn test_legacy_pass_beats_fail() {
        let d = legacy_reason_for_ending(&set(&["2", "1", "6"]), EndingFallback::Unknown);
        assert_eq!(d, Derived { code: "01", matched: true });
        let d = legacy_reason_for_ending(&set(&["2", "6"]), EndingFallback::Unknown);
        assert_eq!(d.code, "02");
    }

    #[test]
    fn test_legacy_fallback_is_configurable() {
        let outcomes = set(&["6"]);
        let completed = legacy_reason_for_ending(&outcomes, EndingFallback::Completed);
        let unknown = legacy_reason_for_ending(&outcomes, EndingFallback::Unknown);
        assert_eq!(completed, Derived { code: "01", matched: false });
        assert_eq!(unknown, Derived { code: "98", matched: false });
    }

    #[test]
    fn test_legacy_completion_order() {
        assert_eq!(legacy_completion(&set(&["1", "4"])).code, "2");
        assert_eq!(legacy_completion(&set(&["1", "6"])).code, "3");
        assert_eq!(legacy_completion(&set(&["C"])).code, "1");
        let none = legacy_completion(&set(&["9"]));
        assert_eq!(none, Derived { code: "3", matched: false });
    }

    // ── Data futures ─────────────────────────────────────────────────

    #[test]
    fn test_df_credit_wins() {
        let outcomes = OutcomeSet::new(["05", "03"], true);
        assert_eq!(data_futures_reason_for_ending(&outcomes).code, "01");
    }

    #[test]
    fn test_df_pending_then_no_credit() {
        assert_eq!(data_futures_reason_for_ending(&set(&["01", "05"])).code, "98");
        let d = data_futures_reason_for_ending(&set(&["01", "03"]));
        assert_eq!(d, Derived { code: "11", matched: false });
    }

    #[test]
    fn test_df_completion_order() {
        assert_eq!(data_futures_completion(&set(&["01", "03", "05"])).code, "02");
        assert_eq!(data_futures_completion(&set(&["01", "05"])).code, "03");
        assert_eq!(data_futures_completion(&set(&["01", "96"])).code, "01");
        assert!(!data_futures_completion(&set(&["96"])).matched);
    }

    // ── Fallback parsing ─────────────────────────────────────────────

    #[test]
    fn test_fallback_from_str() {
        assert_eq!("completed".parse::<EndingFallback>().unwrap(), EndingFallback::Completed);
        assert_eq!(" Unknown ".parse::<EndingFallback>().unwrap(), EndingFallback::Unknown);
        assert!("done".parse::<EndingFallback>().is_err());
        assert_eq!(EndingFallback::default().to_string(), "completed");
    }

    // ── Order independence ───────────────────────────────────────────

    proptest! {
        #[test]
        fn prop_pass_always_awarded(others in proptest::collection::vec("[1-9C]", 0..6), at in 0usize..6) {
            let mut codes = others.clone();
            let at = at.min(codes.len());
            codes.insert(at, "1".to_string());
            let outcomes = OutcomeSet::new(codes.iter().map(String::as_str), false);
            prop_assert_eq!(legacy_reason_for_ending(&outcomes, EndingFallback::Unknown).code, "01");
        }

        #[test]
        fn prop_result_independent_of_order(mut codes in proptest::collection::vec("0[1-5]|96", 0..6)) {
            let forward = data_futures_completion(&OutcomeSet::new(codes.iter().map(String::as_str), false));
            codes.reverse();
            let backward = data_futures_completion(&OutcomeSet::new(codes.iter().map(String::as_str), false));
            prop_assert_eq!(forward, backward);
        }
    }
}
