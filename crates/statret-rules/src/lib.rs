//! # statret-rules — Business Rule Library
//!
//! Pure functions that turn already-loaded rows into coded values. Nothing
//! here touches a database or a clock, so every rule can be exercised with
//! plain in-memory fixtures.
//!
//! ## Never Raise
//!
//! A return must be produced even for imperfect source data. Every rule is
//! total over its inputs and reports a documented sentinel instead of an
//! error:
//!
//! | rule | sentinel |
//! |------|----------|
//! | [`normalize_postcode`] | `None` for anything that is not a UK postcode |
//! | [`elq`] | `None` when no entry qualification is known |
//! | precedence tables ([`outcomes`]) | the table's fallback code, flagged `matched: false` |
//! | [`apportion`] | zero for non-overlapping or zero-length spans |
//!
//! Callers decide how a sentinel is rendered: the legacy schema writes an
//! invalid postcode as an empty element, the newer one omits it.

pub mod codes;
pub mod fees;
pub mod load;
pub mod outcomes;
pub mod postcode;
pub mod text;

pub use codes::{elq, sex_id, ELQ, NOT_ELQ};
pub use fees::{gross_fee, net_fee, round_currency};
pub use load::{apportion, module_span, reference_period_loads};
pub use outcomes::{
    Condition, Derived, EndingFallback, OutcomeSet, PrecedenceRule, UnknownFallback,
};
pub use postcode::normalize_postcode;
pub use text::{normalize_to_latin1, upper_names};
