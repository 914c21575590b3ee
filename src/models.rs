// Wire types for the dashboard API. Resource payloads serialize camelCase
// for the browser frontend; envelope and preview payloads stay snake_case.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registry::{JobRecord, JobStatus};
use crate::sources::Source;

/// Dataset as the dashboard lists it: registry metadata annotated with
/// filesystem facts and provenance
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub uid: Uuid,
    pub name: String,
    pub summary: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub auto_approval: Vec<String>,
    /// Representative private file; the frontend derives the display type
    /// from its extension
    pub private: String,
    /// Recursive byte total of the private tree
    pub private_size: u64,
    pub mock: String,
    pub mock_size: u64,
    pub readme: Option<String>,
    /// Present only for imported datasets
    pub source: Option<Source>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub uid: Uuid,
    pub name: String,
    pub description: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: JobStatus,
    pub dataset_name: String,
    pub tags: Vec<String>,
    pub user_metadata: BTreeMap<String, String>,
    pub error_message: Option<String>,
    pub output_url: Option<String>,
    pub enclave: Option<String>,
}

impl From<JobRecord> for Job {
    fn from(record: JobRecord) -> Self {
        Self {
            uid: record.uid,
            name: record.name,
            description: record.description,
            created_by: record.created_by,
            created_at: record.created_at,
            updated_at: record.updated_at,
            status: record.status,
            dataset_name: record.dataset_name,
            tags: record.tags,
            user_metadata: record.user_metadata,
            error_message: record.error_message,
            output_url: record.output_url,
            enclave: record.enclave,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListDatasetsResponse {
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Serialize)]
pub struct ListTrustedDatasitesResponse {
    pub datasites: Vec<String>,
}

/// Which side of a dataset a file listing covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetSide {
    Private,
    Mock,
}

#[derive(Debug, Serialize)]
pub struct DatasetFilesResponse {
    pub data_dir: String,
    pub files: BTreeMap<String, String>,
    pub dataset_type: DatasetSide,
}

#[derive(Debug, Serialize)]
pub struct JobCodeResponse {
    pub code_dir: String,
    pub files: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct JobOutputResponse {
    pub output_dir: String,
    pub files: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct AccountInfoResponse {
    pub email: String,
    pub is_admin: bool,
    pub host_datasite_url: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
