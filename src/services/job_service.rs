use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Job, JobCodeResponse, JobOutputResponse, ListJobsResponse, MessageResponse};
use crate::preview::PreviewBuilder;
use crate::registry::{JobLogs, JobRecord, RegistryClient};

use super::open_in_file_manager;

/// Job review and dispatch: listing, approval decisions, run requests and
/// the code/output/log views backing the review screens.
pub struct JobService {
    client: Arc<RegistryClient>,
}

impl JobService {
    pub fn new(client: Arc<RegistryClient>) -> Self {
        Self { client }
    }

    pub async fn list_jobs(&self) -> Result<ListJobsResponse, ApiError> {
        let jobs = self
            .client
            .jobs()
            .get_all()?
            .into_iter()
            .map(Job::from)
            .collect();
        Ok(ListJobsResponse { jobs })
    }

    pub async fn get_job(&self, uid: Uuid) -> Result<Job, ApiError> {
        Ok(Job::from(self.get_record(uid)?))
    }

    pub async fn approve_job(&self, uid: Uuid) -> Result<MessageResponse, ApiError> {
        self.client.jobs().approve(uid)?;
        info!("job {} approved", uid);
        Ok(MessageResponse::new(format!("Job {} approved.", uid)))
    }

    pub async fn reject_job(&self, uid: Uuid) -> Result<MessageResponse, ApiError> {
        self.client.jobs().reject(uid)?;
        info!("job {} rejected", uid);
        Ok(MessageResponse::new(format!("Job {} rejected.", uid)))
    }

    pub async fn run_job(&self, uid: Uuid) -> Result<MessageResponse, ApiError> {
        self.get_record(uid)?;
        self.client.jobs().start(uid)?;
        info!("job {} dispatched", uid);
        Ok(MessageResponse::new(format!("Job {} started.", uid)))
    }

    /// Dispatch a job again. Only jobs that already completed a run qualify.
    pub async fn rerun_job(&self, uid: Uuid) -> Result<MessageResponse, ApiError> {
        let record = self.get_record(uid)?;
        if !record.status.is_rerunnable() {
            return Err(ApiError::bad_request(format!(
                "Job {} cannot be rerun. Current status: {}. Only finished or failed jobs can be rerun.",
                uid, record.status
            )));
        }
        self.client.jobs().start(uid)?;
        info!("job {} dispatched again", uid);
        Ok(MessageResponse::new(format!("Job {} restarted.", uid)))
    }

    pub async fn get_logs(&self, uid: Uuid) -> Result<JobLogs, ApiError> {
        self.client.jobs().logs(uid)?.ok_or_else(|| {
            ApiError::not_found(format!(
                "Logs not available for job {}. Job may not have been executed yet.",
                uid
            ))
        })
    }

    /// Preview the submitted code tree. Everything inlines as text so the
    /// reviewer sees exactly what would run.
    pub async fn get_code(&self, uid: Uuid) -> Result<JobCodeResponse, ApiError> {
        self.get_record(uid)?;
        let preview = PreviewBuilder::code().scan(&self.client.jobs().code_dir(uid))?;
        Ok(JobCodeResponse {
            code_dir: preview.dir.display().to_string(),
            files: preview.files,
        })
    }

    pub async fn get_output(&self, uid: Uuid) -> Result<JobOutputResponse, ApiError> {
        self.get_record(uid)?;
        let dir = self.client.jobs().output_dir(uid);
        if !dir.is_dir() {
            return Err(ApiError::not_found(format!(
                "Output not available for job {}. Job may not have been executed yet.",
                uid
            )));
        }
        let preview = PreviewBuilder::code().scan(&dir)?;
        Ok(JobOutputResponse {
            output_dir: preview.dir.display().to_string(),
            files: preview.files,
        })
    }

    pub async fn delete_job(&self, uid: Uuid) -> Result<MessageResponse, ApiError> {
        if !self.client.jobs().delete(uid)? {
            return Err(ApiError::not_found(format!(
                "Job with UID '{}' not found",
                uid
            )));
        }
        Ok(MessageResponse::new(format!("Job {} deleted.", uid)))
    }

    pub async fn delete_all_jobs(&self) -> Result<usize, ApiError> {
        let deleted = self.client.jobs().delete_all()?;
        info!("deleted all {} job(s)", deleted);
        Ok(deleted)
    }

    pub async fn open_code_directory(&self, uid: Uuid) -> Result<MessageResponse, ApiError> {
        self.get_record(uid)?;
        let dir = self.client.jobs().code_dir(uid);
        if !dir.is_dir() {
            return Err(ApiError::not_found(format!(
                "Code directory not found for job {}",
                uid
            )));
        }
        open_in_file_manager(dir).await?;
        Ok(MessageResponse::new(format!(
            "Opened code directory for job {}",
            uid
        )))
    }

    fn get_record(&self, uid: Uuid) -> Result<JobRecord, ApiError> {
        self.client
            .jobs()
            .get(uid)?
            .ok_or_else(|| ApiError::not_found(format!("Job with UID '{}' not found", uid)))
    }
}
