use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use super::workspace::Workspace;
use super::RegistryError;

const DATASET_META: &str = "dataset.yaml";

/// Persisted metadata of one dataset, stored as YAML next to its data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub uid: Uuid,
    pub name: String,
    pub summary: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Datasite emails whose jobs against this dataset skip manual review
    #[serde(default)]
    pub auto_approval: Vec<String>,
}

/// Everything needed to admit a new dataset: staged data trees plus metadata
#[derive(Debug)]
pub struct CreateDataset<'a> {
    pub name: &'a str,
    pub summary: &'a str,
    pub files_dir: &'a Path,
    pub mock_dir: &'a Path,
    pub description_file: &'a Path,
    pub auto_approval: Vec<String>,
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct DatasetUpdate {
    pub uid: Uuid,
    pub name: Option<String>,
    pub summary: Option<String>,
    pub auto_approval: Option<Vec<String>>,
}

/// Dataset registry rooted at `<workspace>/datasets`, one directory per
/// dataset keyed by its unique name.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    workspace: Workspace,
    owner: String,
}

impl DatasetStore {
    pub fn new(workspace: Workspace, owner: String) -> Self {
        Self { workspace, owner }
    }

    pub fn root_dir(&self, record: &DatasetRecord) -> PathBuf {
        self.dataset_dir(&record.name)
    }

    pub fn private_dir(&self, record: &DatasetRecord) -> PathBuf {
        self.dataset_dir(&record.name).join("private")
    }

    pub fn mock_dir(&self, record: &DatasetRecord) -> PathBuf {
        self.dataset_dir(&record.name).join("mock")
    }

    pub fn readme_file(&self, record: &DatasetRecord) -> PathBuf {
        self.dataset_dir(&record.name).join("README.md")
    }

    /// Import staged data as a new dataset. The whole tree is copied into
    /// place before the metadata file lands, so a half-written dataset never
    /// carries a readable record.
    pub fn create(&self, spec: CreateDataset<'_>) -> Result<DatasetRecord, RegistryError> {
        if !is_valid_name(spec.name) {
            return Err(RegistryError::InvalidDatasetName(spec.name.to_string()));
        }
        let dir = self.dataset_dir(spec.name);
        if dir.exists() {
            return Err(RegistryError::DatasetExists(spec.name.to_string()));
        }

        let now = Utc::now();
        let record = DatasetRecord {
            uid: Uuid::new_v4(),
            name: spec.name.to_string(),
            summary: spec.summary.to_string(),
            created_by: self.owner.clone(),
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
            auto_approval: spec.auto_approval,
        };

        fs::create_dir_all(&dir)?;
        copy_tree(spec.files_dir, &dir.join("private"))?;
        copy_tree(spec.mock_dir, &dir.join("mock"))?;
        fs::copy(spec.description_file, dir.join("README.md"))?;
        self.write_record(&record)?;
        debug!("dataset '{}' registered at {}", record.name, dir.display());
        Ok(record)
    }

    /// All datasets in name order. Directories with unreadable metadata are
    /// skipped with a warning instead of failing the listing.
    pub fn get_all(&self) -> Result<Vec<DatasetRecord>, RegistryError> {
        let dir = self.workspace.datasets_dir();
        let mut records = Vec::new();
        if !dir.is_dir() {
            return Ok(records);
        }
        let mut entries: Vec<_> = fs::read_dir(&dir)?.collect::<Result<_, _>>()?;
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            let meta = entry.path().join(DATASET_META);
            if !meta.is_file() {
                continue;
            }
            match self.read_record(&meta) {
                Ok(record) => records.push(record),
                Err(e) => warn!("skipping unreadable dataset record: {}", e),
            }
        }
        Ok(records)
    }

    pub fn get(&self, uid: Uuid) -> Result<Option<DatasetRecord>, RegistryError> {
        Ok(self.get_all()?.into_iter().find(|r| r.uid == uid))
    }

    pub fn get_by_name(&self, name: &str) -> Result<Option<DatasetRecord>, RegistryError> {
        if !is_valid_name(name) {
            return Ok(None);
        }
        let meta = self.dataset_dir(name).join(DATASET_META);
        if !meta.is_file() {
            return Ok(None);
        }
        self.read_record(&meta).map(Some)
    }

    /// Apply a partial update. Renames move the dataset directory, so the
    /// new name must not collide with an existing dataset.
    pub fn update(&self, update: DatasetUpdate) -> Result<DatasetRecord, RegistryError> {
        let mut record = self
            .get(update.uid)?
            .ok_or_else(|| RegistryError::DatasetNotFound(update.uid.to_string()))?;

        if let Some(name) = update.name {
            if name != record.name {
                if !is_valid_name(&name) {
                    return Err(RegistryError::InvalidDatasetName(name));
                }
                let target = self.dataset_dir(&name);
                if target.exists() {
                    return Err(RegistryError::DatasetExists(name));
                }
                fs::rename(self.dataset_dir(&record.name), &target)?;
                record.name = name;
            }
        }
        if let Some(summary) = update.summary {
            record.summary = summary;
        }
        if let Some(auto_approval) = update.auto_approval {
            record.auto_approval = auto_approval;
        }
        record.updated_at = Utc::now();
        self.write_record(&record)?;
        Ok(record)
    }

    /// Replace the private data tree with freshly synced content
    pub fn update_private_data(&self, uid: Uuid, src: &Path) -> Result<DatasetRecord, RegistryError> {
        let mut record = self
            .get(uid)?
            .ok_or_else(|| RegistryError::DatasetNotFound(uid.to_string()))?;
        let dest = self.private_dir(&record);
        if dest.exists() {
            fs::remove_dir_all(&dest)?;
        }
        copy_tree(src, &dest)?;
        record.updated_at = Utc::now();
        self.write_record(&record)?;
        Ok(record)
    }

    /// Remove a dataset by name. Returns whether anything was deleted.
    /// Invalid names can never have been registered, so they report false
    /// instead of resolving a path such as `..` outside the datasets root.
    pub fn delete(&self, name: &str) -> Result<bool, RegistryError> {
        if !is_valid_name(name) {
            return Ok(false);
        }
        let dir = self.dataset_dir(name);
        if !dir.is_dir() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)?;
        debug!("dataset '{}' deleted", name);
        Ok(true)
    }

    fn dataset_dir(&self, name: &str) -> PathBuf {
        self.workspace.datasets_dir().join(name)
    }

    fn write_record(&self, record: &DatasetRecord) -> Result<(), RegistryError> {
        let path = self.dataset_dir(&record.name).join(DATASET_META);
        let yaml = serde_yaml::to_string(record).map_err(|source| RegistryError::Metadata {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, yaml)?;
        Ok(())
    }

    fn read_record(&self, path: &Path) -> Result<DatasetRecord, RegistryError> {
        let raw = fs::read_to_string(path)?;
        serde_yaml::from_str(&raw).map_err(|source| RegistryError::Metadata {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Dataset names become directory names, so they are restricted to a safe
/// character set and must not start with a dot
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 100
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.'))
}

/// Recursive byte total of a directory; 0 when it does not exist
pub fn dir_size(dir: &Path) -> u64 {
    if !dir.is_dir() {
        return 0;
    }
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

/// Representative file of a data tree (downloads, display type): the
/// shallowest file, name order breaking ties
pub fn first_file(dir: &Path) -> Option<PathBuf> {
    if !dir.is_dir() {
        return None;
    }
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .min_by_key(|e| e.depth())
        .map(|e| e.into_path())
}

fn copy_tree(src: &Path, dest: &Path) -> Result<(), RegistryError> {
    fs::create_dir_all(dest)?;
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(std::io::Error::from)?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
