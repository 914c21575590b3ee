// Local registry of the datasite workspace: datasets, jobs and app state
pub mod client;
pub mod dataset;
pub mod job;
pub mod workspace;

pub use client::RegistryClient;
pub use dataset::{CreateDataset, DatasetRecord, DatasetStore, DatasetUpdate};
pub use job::{JobLogs, JobRecord, JobStatus, JobStore};
pub use workspace::Workspace;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("dataset '{0}' already exists")]
    DatasetExists(String),
    #[error("invalid dataset name '{0}'")]
    InvalidDatasetName(String),
    #[error("dataset '{0}' not found")]
    DatasetNotFound(String),
    #[error("job '{0}' not found")]
    JobNotFound(uuid::Uuid),
    #[error("invalid metadata file {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
