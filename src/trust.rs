// Persistent auto-approval list of trusted datasites
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum TrustStoreError {
    #[error("failed to read trusted datasites file: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to write trusted datasites file: {0}")]
    Write(#[source] std::io::Error),
    #[error("failed to encode trusted datasites file: {0}")]
    Encode(#[from] serde_json::Error),
}

/// JSON file holding the datasite emails whose jobs are auto-approved.
/// Jobs from anyone else wait for manual review.
#[derive(Debug, Clone)]
pub struct TrustStore {
    path: PathBuf,
}

impl TrustStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lock file guarding writers; sibling of the list itself
    pub fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Read the list, creating an empty file on first use.
    ///
    /// A corrupt file is logged and read as empty so the dashboard keeps
    /// working; the next save rewrites it wholesale.
    pub fn load(&self) -> Result<Vec<String>, TrustStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(TrustStoreError::Read)?;
        }
        if !self.path.exists() {
            fs::write(&self.path, "[]").map_err(TrustStoreError::Write)?;
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(TrustStoreError::Read)?;
        match serde_json::from_str(&raw) {
            Ok(datasites) => Ok(datasites),
            Err(e) => {
                error!(
                    "trusted datasites file {} is not valid JSON ({}), treating as empty",
                    self.path.display(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    pub fn save(&self, datasites: &[String]) -> Result<(), TrustStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(TrustStoreError::Write)?;
        }
        let json = serde_json::to_string_pretty(datasites)?;
        fs::write(&self.path, json).map_err(TrustStoreError::Write)
    }
}

/// Trim whitespace and drop empty entries before persisting
pub fn normalize_list(datasites: &[String]) -> Vec<String> {
    datasites
        .iter()
        .map(|d| d.trim())
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}
