//! # Staging Field Values
//!
//! A staging record's exportable fields hold a `FieldValue` or nothing.
//! The distinction matters to the serializer:
//!
//! | stored                 | required field    | optional field |
//! |------------------------|-------------------|----------------|
//! | `None`                 | empty element     | omitted        |
//! | `Some(Empty)`          | empty element     | empty element  |
//! | `Some(Text("x"))` etc. | `<TAG>x</TAG>`    | `<TAG>x</TAG>` |
//!
//! `Empty` is how a rule says "present but blank" for a field the regulator
//! distinguishes from absent, e.g. a UK postcode that failed validation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A scalar already in its final external representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Free text or a code.
    Text(String),
    /// An integer.
    Int(i64),
    /// A decimal, rendered with its stored scale.
    Decimal(Decimal),
    /// A calendar date, rendered `YYYY-MM-DD`.
    Date(NaiveDate),
    /// Present but blank.
    Empty,
}

impl FieldValue {
    /// Shorthand for a text value.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// The rendered string, as it will appear in the document.
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Decimal(d) => d.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Empty => String::new(),
        }
    }

    /// Whether the value is a blank.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Compare the rendered form against a code, e.g. `value.is("01")`.
    ///
    /// Rules written against codes work whether the field was stored as
    /// text or as an integer.
    pub fn is(&self, code: &str) -> bool {
        match self {
            Self::Text(s) => s == code,
            Self::Empty => false,
            other => other.render() == code,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<Decimal> for FieldValue {
    fn from(d: Decimal) -> Self {
        Self::Decimal(d)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}
