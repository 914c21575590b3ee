// Provenance records for datasets imported from outside the workspace
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::lockfile::FileLock;

/// Where a dataset's private data came from, carrying enough detail to
/// re-sync it later. Tagged so new source kinds can be added without
/// breaking persisted registries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Source {
    ExternalStore { store_url: Url, access_token: String },
}

#[derive(Debug, Error)]
pub enum SourceStoreError {
    #[error("failed to read dataset source registry: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to write dataset source registry: {0}")]
    Write(#[source] std::io::Error),
    #[error("dataset source registry is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// JSON registry mapping dataset UIDs to their sources, kept in the app's
/// private workspace area. Datasets without an entry were uploaded by hand.
#[derive(Debug, Clone)]
pub struct SourceStore {
    path: PathBuf,
}

impl SourceStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn find(&self, uid: Uuid) -> Result<Option<Source>, SourceStoreError> {
        Ok(self.load()?.remove(&uid))
    }

    /// Record (or replace) the source of a dataset. The whole
    /// load-modify-save cycle runs under an advisory lock so concurrent
    /// imports cannot drop each other's entries.
    pub fn add(&self, uid: Uuid, source: Source) -> Result<(), SourceStoreError> {
        let _lock =
            FileLock::acquire(&self.path.with_extension("lock")).map_err(SourceStoreError::Write)?;
        let mut sources = self.load()?;
        sources.insert(uid, source);
        self.save(&sources)
    }

    fn load(&self) -> Result<HashMap<Uuid, Source>, SourceStoreError> {
        if !self.path.is_file() {
            return Ok(HashMap::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(SourceStoreError::Read)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, sources: &HashMap<Uuid, Source>) -> Result<(), SourceStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(SourceStoreError::Write)?;
        }
        let json = serde_json::to_string_pretty(sources)?;
        fs::write(&self.path, json).map_err(SourceStoreError::Write)
    }
}
