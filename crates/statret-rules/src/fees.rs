//! # Fee Aggregation
//!
//! Sums of signed fee ledger lines, rounded to whole currency units with
//! half-away-from-zero rounding. "Gross" counts only charges; "net" also
//! subtracts refunds and credits.

use rust_decimal::{Decimal, RoundingStrategy};
use statret_records::LedgerLine;

/// Round to a whole unit, halves away from zero.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// Sum of the positive lines, rounded.
pub fn gross_fee<'a>(lines: impl IntoIterator<Item = &'a LedgerLine>) -> Decimal {
    round_currency(
        lines
            .into_iter()
            .map(|l| l.amount)
            .filter(|a| a.is_sign_positive() && !a.is_zero())
            .sum(),
    )
}

/// Sum of all lines, rounded.
pub fn net_fee<'a>(lines: impl IntoIterator<Item = &'a LedgerLine>) -> Decimal {
    round_currency(lines.into_iter().map(|l| l.amount).sum())
}
