//! # Identity Newtypes
//!
//! Typed identifiers for batches, reporting years and schema generations.
//! A `BatchId` is a storage surrogate and never appears in the emitted
//! document; an `AcademicYear` appears everywhere.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Storage identifier of one generated return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(pub i64);

impl BatchId {
    /// Access the inner integer.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The first calendar year of an academic year (2022 means 2022/23).
///
/// Restricted to `1991..=2090`: checksum identifiers carry only the last
/// two digits of the year, and the regulator's scheme reserves that span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct AcademicYear(i32);

impl AcademicYear {
    /// Lowest accepted year.
    pub const MIN: i32 = 1991;
    /// Highest accepted year.
    pub const MAX: i32 = 2090;

    /// Validate and wrap a year.
    pub fn new(year: i32) -> Result<Self, CoreError> {
        if !(Self::MIN..=Self::MAX).contains(&year) {
            return Err(CoreError::YearOutOfRange {
                year,
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        Ok(Self(year))
    }

    /// The full year.
    pub fn value(&self) -> i32 {
        self.0
    }

    /// The last two digits, zero-padded (`2005` gives `"05"`).
    pub fn two_digits(&self) -> String {
        format!("{:02}", self.0 % 100)
    }
}

impl TryFrom<i32> for AcademicYear {
    type Error = CoreError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AcademicYear> for i32 {
    fn from(year: AcademicYear) -> Self {
        year.0
    }
}

impl std::fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which version of the regulator's record schema a batch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Generation {
    /// The older instance-based student record.
    Legacy,
    /// The newer engagement-based collection.
    DataFutures,
}

impl Generation {
    /// Stable lowercase name, used in storage and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::DataFutures => "data-futures",
        }
    }

    /// Content-store directory for documents of this generation.
    pub fn subsystem(&self) -> &'static str {
        match self {
            Self::Legacy => "hesa",
            Self::DataFutures => "hesa_data_futures",
        }
    }

    /// Deterministic document filename for a batch.
    pub fn filename(&self, prefix: &str, batch: BatchId) -> String {
        match self {
            Self::Legacy => format!("{prefix}_batch_{batch}.xml"),
            Self::DataFutures => format!("{prefix}_data_futures_batch_{batch}.xml"),
        }
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Generation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(Self::Legacy),
            "data-futures" | "data_futures" => Ok(Self::DataFutures),
            other => Err(CoreError::UnknownGeneration(other.to_string())),
        }
    }
}
