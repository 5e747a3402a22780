//! Generated documents on disk.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::StoreError;

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes).iter().map(|b| format!("{b:02x}")).collect()
}

/// Documents stored under `<root>/<subsystem>/<filename>`.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a document lives.
    pub fn path_for(&self, subsystem: &str, filename: &str) -> PathBuf {
        self.root.join(subsystem).join(filename)
    }

    /// Write a document, replacing any previous version.
    pub async fn write(
        &self,
        subsystem: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, StoreError> {
        let dir = self.root.join(subsystem);
        tokio::fs::create_dir_all(&dir).await.map_err(|source| StoreError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        let path = dir.join(filename);
        tokio::fs::write(&path, bytes).await.map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "document stored");
        Ok(path)
    }

    /// Read a stored document.
    pub async fn read(&self, subsystem: &str, filename: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(subsystem, filename);
        tokio::fs::read(&path).await.map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}
