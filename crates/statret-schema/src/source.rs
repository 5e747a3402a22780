//! Where a schema definition comes from.
//!
//! The regulator publishes its definition at a versioned URL; a local copy
//! may be used instead. Either way the definition is read in full before
//! it is compiled.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::validate::SchemaValidationError;

/// Timeout for fetching a remote definition.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// A schema definition on disk or behind an `http(s)` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    File(PathBuf),
    Url(String),
}

impl SchemaSource {
    /// Interpret a configured location. Anything that is not an `http://`
    /// or `https://` URL is a file path.
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(location.to_string())
        } else {
            Self::File(PathBuf::from(location))
        }
    }

    /// Read the definition.
    pub async fn fetch(&self) -> Result<Vec<u8>, SchemaValidationError> {
        match self {
            Self::File(path) => tokio::fs::read(path)
                .await
                .map_err(|e| self.load_error(format!("cannot read file: {e}"))),
            Self::Url(url) => {
                let client = reqwest::Client::builder()
                    .timeout(FETCH_TIMEOUT)
                    .build()
                    .map_err(|e| self.load_error(format!("failed to build HTTP client: {e}")))?;
                let response = client
                    .get(url)
                    .send()
                    .await
                    .and_then(reqwest::Response::error_for_status)
                    .map_err(|e| self.load_error(format!("fetch failed: {e}")))?;
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| self.load_error(format!("fetch failed: {e}")))?;
                tracing::debug!(schema = %self, bytes = body.len(), "schema fetched");
                Ok(body.to_vec())
            }
        }
    }

    fn load_error(&self, reason: String) -> SchemaValidationError {
        SchemaValidationError::SchemaLoadError {
            location: self.to_string(),
            reason,
        }
    }
}

impl From<&str> for SchemaSource {
    fn from(location: &str) -> Self {
        Self::parse(location)
    }
}

impl From<PathBuf> for SchemaSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}
