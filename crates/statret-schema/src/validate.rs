//! # Schema Validation
//!
//! Compiles an XML Schema definition and checks encoded documents against
//! it.
//!
//! Validation failures are data, not errors: [`DocumentValidator::validate`]
//! always returns a [`ValidationReport`]. Only loading or compiling the
//! definition can fail, and [`validate_with`] folds even that into the
//! report so a return is still produced when the definition is missing or
//! broken.

use std::collections::BTreeMap;

use libxml::error::StructuredError;
use libxml::parser::{Parser, ParserOptions};
use libxml::schemas::{SchemaParserContext, SchemaValidationContext};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::SchemaSource;

/// Error loading a schema definition.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The definition could not be read or fetched.
    #[error("schema load error for '{location}': {reason}")]
    SchemaLoadError {
        /// File path or URL of the definition.
        location: String,
        /// Reason the definition could not be loaded.
        reason: String,
    },

    /// The definition was read but libxml2 could not compile it.
    #[error("schema parse error for '{location}': {reason}")]
    SchemaParseError {
        /// File path or URL of the definition.
        location: String,
        /// libxml2's messages, joined.
        reason: String,
    },
}

/// Violation messages and how often each occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationReport {
    counts: BTreeMap<String, usize>,
}

impl ValidationReport {
    /// Count one occurrence of a message.
    pub fn record(&mut self, message: impl Into<String>) {
        *self.counts.entry(message.into()).or_insert(0) += 1;
    }

    /// Whether nothing was reported.
    pub fn is_clean(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total occurrences across all messages.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Message to occurrence count, ordered by message.
    pub fn counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }

    pub fn into_counts(self) -> BTreeMap<String, usize> {
        self.counts
    }
}

impl From<BTreeMap<String, usize>> for ValidationReport {
    fn from(counts: BTreeMap<String, usize>) -> Self {
        Self { counts }
    }
}

/// A compiled schema definition.
///
/// Holds libxml2 state, so it is neither `Send` nor `Sync`. Build one,
/// validate, and drop it without awaiting in between.
pub struct DocumentValidator {
    location: String,
    context: SchemaValidationContext,
}

impl std::fmt::Debug for DocumentValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentValidator")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl DocumentValidator {
    /// Compile a definition already read from `location`.
    pub fn from_bytes(
        location: impl Into<String>,
        definition: &[u8],
    ) -> Result<Self, SchemaValidationError> {
        let location = location.into();
        let mut parser = SchemaParserContext::from_buffer(definition);
        let context = SchemaValidationContext::from_parser(&mut parser).map_err(|errors| {
            SchemaValidationError::SchemaParseError {
                location: location.clone(),
                reason: errors.iter().map(message).collect::<Vec<_>>().join("; "),
            }
        })?;
        Ok(Self { location, context })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Check an encoded document.
    pub fn validate(&mut self, document: &[u8]) -> ValidationReport {
        let mut report = ValidationReport::default();
        let options = ParserOptions {
            recover: false,
            no_net: true,
            ..ParserOptions::default()
        };
        match Parser::default().parse_string_with_options(document, options) {
            Ok(doc) => {
                if let Err(errors) = self.context.validate_document(&doc) {
                    for error in &errors {
                        report.record(message(error));
                    }
                }
            }
            Err(e) => report.record(format!("document is not well-formed XML: {e:?}")),
        }
        if !report.is_clean() {
            tracing::warn!(
                schema = %self.location,
                violations = report.total(),
                distinct = report.counts().len(),
                "document does not conform to schema"
            );
        }
        report
    }
}

fn message(error: &StructuredError) -> String {
    error
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or("unspecified libxml2 error")
        .to_string()
}

/// Load the definition at `source` and check `document` against it. A
/// definition that cannot be loaded or compiled is reported as a single
/// violation.
pub async fn validate_with(source: &SchemaSource, document: &[u8]) -> ValidationReport {
    let compiled = match source.fetch().await {
        Ok(definition) => DocumentValidator::from_bytes(source.to_string(), &definition),
        Err(e) => Err(e),
    };
    match compiled {
        Ok(mut validator) => validator.validate(document),
        Err(e) => {
            tracing::warn!(error = %e, "schema unavailable, document not validated");
            let mut report = ValidationReport::default();
            report.record(e.to_string());
            report
        }
    }
}
