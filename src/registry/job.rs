use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::workspace::Workspace;
use super::RegistryError;

const JOB_META: &str = "job.yaml";

/// Lifecycle of a submitted job. The sync and execution layers move jobs
/// through the run states; the dashboard only reviews and dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    PendingCodeReview,
    Approved,
    Rejected,
    JobRunFailed,
    JobRunFinished,
    Shared,
}

impl JobStatus {
    /// Only jobs that already completed a run can be dispatched again
    pub fn is_rerunnable(self) -> bool {
        matches!(
            self,
            JobStatus::JobRunFinished | JobStatus::JobRunFailed | JobStatus::Shared
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::PendingCodeReview => "pending_code_review",
            JobStatus::Approved => "approved",
            JobStatus::Rejected => "rejected",
            JobStatus::JobRunFailed => "job_run_failed",
            JobStatus::JobRunFinished => "job_run_finished",
            JobStatus::Shared => "shared",
        };
        f.write_str(s)
    }
}

/// Persisted metadata of one submitted job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub uid: Uuid,
    pub name: String,
    pub description: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: JobStatus,
    pub dataset_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub user_metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub output_url: Option<String>,
    #[serde(default)]
    pub enclave: Option<String>,
    /// Set when the operator dispatches a run; the execution layer takes it
    /// from there
    #[serde(default)]
    pub run_requested_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Fresh submission awaiting review
    pub fn new(name: &str, description: &str, created_by: &str, dataset_name: &str) -> Self {
        let now = Utc::now();
        Self {
            uid: Uuid::new_v4(),
            name: name.to_string(),
            description: description.to_string(),
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
            status: JobStatus::PendingCodeReview,
            dataset_name: dataset_name.to_string(),
            tags: Vec::new(),
            user_metadata: BTreeMap::new(),
            error_message: None,
            output_url: None,
            enclave: None,
            run_requested_at: None,
        }
    }
}

/// Captured stdout and stderr of a job run
#[derive(Debug, Clone, Serialize)]
pub struct JobLogs {
    pub stdout: String,
    pub stderr: String,
}

/// Job registry rooted at `<workspace>/jobs`, one directory per job keyed
/// by its UID.
#[derive(Debug, Clone)]
pub struct JobStore {
    workspace: Workspace,
}

impl JobStore {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }

    pub fn code_dir(&self, uid: Uuid) -> PathBuf {
        self.job_dir(uid).join("code")
    }

    pub fn output_dir(&self, uid: Uuid) -> PathBuf {
        self.job_dir(uid).join("output")
    }

    pub fn logs_dir(&self, uid: Uuid) -> PathBuf {
        self.job_dir(uid).join("logs")
    }

    /// Admit a job into the registry. Jobs normally arrive through the sync
    /// layer; the dashboard only mutates them afterwards.
    pub fn insert(&self, record: &JobRecord) -> Result<(), RegistryError> {
        fs::create_dir_all(self.code_dir(record.uid))?;
        self.write_record(record)
    }

    /// All jobs in directory order. Unreadable records are skipped with a
    /// warning instead of failing the listing.
    pub fn get_all(&self) -> Result<Vec<JobRecord>, RegistryError> {
        let dir = self.workspace.jobs_dir();
        let mut records = Vec::new();
        if !dir.is_dir() {
            return Ok(records);
        }
        let mut entries: Vec<_> = fs::read_dir(&dir)?.collect::<Result<_, _>>()?;
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            let meta = entry.path().join(JOB_META);
            if !meta.is_file() {
                continue;
            }
            match self.read_record(&meta) {
                Ok(record) => records.push(record),
                Err(e) => warn!("skipping unreadable job record: {}", e),
            }
        }
        Ok(records)
    }

    pub fn get(&self, uid: Uuid) -> Result<Option<JobRecord>, RegistryError> {
        let meta = self.job_dir(uid).join(JOB_META);
        if !meta.is_file() {
            return Ok(None);
        }
        self.read_record(&meta).map(Some)
    }

    pub fn approve(&self, uid: Uuid) -> Result<JobRecord, RegistryError> {
        self.set_status(uid, JobStatus::Approved)
    }

    pub fn reject(&self, uid: Uuid) -> Result<JobRecord, RegistryError> {
        self.set_status(uid, JobStatus::Rejected)
    }

    pub fn set_status(&self, uid: Uuid, status: JobStatus) -> Result<JobRecord, RegistryError> {
        let mut record = self.get(uid)?.ok_or(RegistryError::JobNotFound(uid))?;
        record.status = status;
        record.updated_at = Utc::now();
        self.write_record(&record)?;
        debug!("job {} moved to status {}", uid, status);
        Ok(record)
    }

    /// Record that a run was requested. The execution layer watches for this
    /// and owns the status from then on.
    pub fn start(&self, uid: Uuid) -> Result<JobRecord, RegistryError> {
        let mut record = self.get(uid)?.ok_or(RegistryError::JobNotFound(uid))?;
        let now = Utc::now();
        record.run_requested_at = Some(now);
        record.updated_at = now;
        self.write_record(&record)?;
        debug!("job {} dispatched for execution", uid);
        Ok(record)
    }

    /// Captured run logs, or `None` when the job never ran (or is unknown)
    pub fn logs(&self, uid: Uuid) -> Result<Option<JobLogs>, RegistryError> {
        let dir = self.logs_dir(uid);
        if !dir.is_dir() {
            return Ok(None);
        }
        Ok(Some(JobLogs {
            stdout: read_log(&dir.join("stdout.log"))?,
            stderr: read_log(&dir.join("stderr.log"))?,
        }))
    }

    /// Remove a job by UID. Returns whether anything was deleted.
    pub fn delete(&self, uid: Uuid) -> Result<bool, RegistryError> {
        let dir = self.job_dir(uid);
        if !dir.is_dir() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)?;
        debug!("job {} deleted", uid);
        Ok(true)
    }

    pub fn delete_all(&self) -> Result<usize, RegistryError> {
        let mut deleted = 0;
        for record in self.get_all()? {
            if self.delete(record.uid)? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    fn job_dir(&self, uid: Uuid) -> PathBuf {
        self.workspace.jobs_dir().join(uid.to_string())
    }

    fn write_record(&self, record: &JobRecord) -> Result<(), RegistryError> {
        let path = self.job_dir(record.uid).join(JOB_META);
        let yaml = serde_yaml::to_string(record).map_err(|source| RegistryError::Metadata {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, yaml)?;
        Ok(())
    }

    fn read_record(&self, path: &std::path::Path) -> Result<JobRecord, RegistryError> {
        let raw = fs::read_to_string(path)?;
        serde_yaml::from_str(&raw).map_err(|source| RegistryError::Metadata {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Missing log files read as empty; a run may capture only one stream
fn read_log(path: &std::path::Path) -> Result<String, RegistryError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}
