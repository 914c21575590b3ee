use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Job, JobCodeResponse, JobOutputResponse, ListJobsResponse, MessageResponse};
use crate::registry::JobLogs;
use crate::services::JobService;
use crate::state::AppState;

async fn job_service(state: &AppState) -> Result<JobService, ApiError> {
    Ok(JobService::new(state.registry().await?))
}

/// GET /api/v1/jobs - list all jobs
pub async fn list_jobs(State(state): State<AppState>) -> Result<Json<ListJobsResponse>, ApiError> {
    Ok(Json(job_service(&state).await?.list_jobs().await?))
}

/// GET /api/v1/jobs/:job_uid - show a single job
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_uid): Path<Uuid>,
) -> Result<Json<Job>, ApiError> {
    Ok(Json(job_service(&state).await?.get_job(job_uid).await?))
}

/// POST /api/v1/jobs/approve/:job_uid - approve submitted code for execution
pub async fn approve_job(
    State(state): State<AppState>,
    Path(job_uid): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(job_service(&state).await?.approve_job(job_uid).await?))
}

/// POST /api/v1/jobs/reject/:job_uid - reject submitted code
pub async fn reject_job(
    State(state): State<AppState>,
    Path(job_uid): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(job_service(&state).await?.reject_job(job_uid).await?))
}

/// POST /api/v1/jobs/run/:job_uid - dispatch an approved job against private data
pub async fn run_job(
    State(state): State<AppState>,
    Path(job_uid): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(job_service(&state).await?.run_job(job_uid).await?))
}

/// POST /api/v1/jobs/rerun/:job_uid - dispatch a finished or failed job again
pub async fn rerun_job(
    State(state): State<AppState>,
    Path(job_uid): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(job_service(&state).await?.rerun_job(job_uid).await?))
}

/// GET /api/v1/jobs/logs/:job_uid - stdout and stderr of the last run
pub async fn get_job_logs(
    State(state): State<AppState>,
    Path(job_uid): Path<Uuid>,
) -> Result<Json<JobLogs>, ApiError> {
    Ok(Json(job_service(&state).await?.get_logs(job_uid).await?))
}

/// GET /api/v1/jobs/code/:job_uid - preview the submitted code tree
pub async fn get_job_code(
    State(state): State<AppState>,
    Path(job_uid): Path<Uuid>,
) -> Result<Json<JobCodeResponse>, ApiError> {
    Ok(Json(job_service(&state).await?.get_code(job_uid).await?))
}

/// GET /api/v1/jobs/output/:job_uid - preview the output tree of the last run
pub async fn get_job_output(
    State(state): State<AppState>,
    Path(job_uid): Path<Uuid>,
) -> Result<Json<JobOutputResponse>, ApiError> {
    Ok(Json(job_service(&state).await?.get_output(job_uid).await?))
}

/// GET /api/v1/jobs/open-code/:job_uid - reveal the code directory in the file manager
pub async fn open_job_code(
    State(state): State<AppState>,
    Path(job_uid): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(
        job_service(&state)
            .await?
            .open_code_directory(job_uid)
            .await?,
    ))
}

/// DELETE /api/v1/jobs/:job_uid - delete a single job
pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_uid): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(job_service(&state).await?.delete_job(job_uid).await?))
}

/// DELETE /api/v1/jobs - delete every job in the workspace
pub async fn delete_all_jobs(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let deleted = job_service(&state).await?.delete_all_jobs().await?;
    Ok(Json(json!({ "deleted": deleted })))
}
