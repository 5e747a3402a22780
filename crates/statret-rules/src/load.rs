//! # Reference-Period Apportionment
//!
//! A module's working-time equivalent is spread evenly over the days it
//! runs. The share that falls inside a reference period is
//!
//! ```text
//! fte × overlap_days / module_days
//! ```
//!
//! with both day counts inclusive. Non-overlapping spans give zero, and the
//! share can never exceed the module's full value.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use statret_core::{DateSpan, ReportingWindow};

/// A module's span. A missing end date means a single-day module.
pub fn module_span(start: NaiveDate, end: Option<NaiveDate>) -> DateSpan {
    DateSpan::new(start, end.unwrap_or(start))
}

/// The part of `fte` falling inside `period`.
pub fn apportion(fte: Decimal, module: &DateSpan, period: &DateSpan) -> Decimal {
    let days = module.days();
    if days == 0 {
        return Decimal::ZERO;
    }
    let overlap = module.overlap_days(period);
    (fte * Decimal::from(overlap) / Decimal::from(days)).max(Decimal::ZERO)
}

/// Per-period load of a set of modules, rounded to one decimal place.
///
/// Periods whose rounded load is zero are left out.
pub fn reference_period_loads<I>(window: &ReportingWindow, modules: I) -> Vec<(&'static str, Decimal)>
where
    I: IntoIterator<Item = (Decimal, DateSpan)>,
{
    let modules: Vec<(Decimal, DateSpan)> = modules.into_iter().collect();
    window
        .reference_periods()
        .iter()
        .filter_map(|period| {
            let load: Decimal = modules
                .iter()
                .map(|(fte, span)| apportion(*fte, span, &period.span))
                .sum();
            let rounded = load
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
                .normalize();
            (!rounded.is_zero()).then_some((period.code, rounded))
        })
        .collect()
}
