use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    Dataset, DatasetFilesResponse, DatasetSide, ListDatasetsResponse, MessageResponse,
};
use crate::registry::DatasetUpdate;
use crate::services::{DatasetService, StoreImportService};
use crate::staging::UploadedFile;
use crate::state::AppState;

const MAX_NAME_LENGTH: usize = 100;
const MAX_DESCRIPTION_LENGTH: usize = 350;

async fn dataset_service(state: &AppState) -> Result<DatasetService, ApiError> {
    Ok(DatasetService::new(
        state.registry().await?,
        state.http().clone(),
        state.config().mock_data.clone(),
    ))
}

async fn store_service(state: &AppState) -> Result<StoreImportService, ApiError> {
    Ok(StoreImportService::new(
        state.registry().await?,
        state.http().clone(),
        state.config().mock_data.clone(),
    ))
}

fn validate_name(name: &str) -> Result<String, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Dataset name is required"));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Dataset name must be at most {} characters",
            MAX_NAME_LENGTH
        )));
    }
    Ok(name.to_string())
}

fn validate_description(description: &str) -> Result<(), ApiError> {
    if description.len() > MAX_DESCRIPTION_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Dataset description must be at most {} characters",
            MAX_DESCRIPTION_LENGTH
        )));
    }
    Ok(())
}

/// GET /api/v1/datasets - list all datasets with sizes and provenance
pub async fn list_datasets(
    State(state): State<AppState>,
) -> Result<Json<ListDatasetsResponse>, ApiError> {
    Ok(Json(dataset_service(&state).await?.list_datasets().await?))
}

/// POST /api/v1/datasets/create-from-file - create a dataset from uploaded files
///
/// Multipart form: one or more `dataset` file parts, a `name`, an optional
/// `description` and optional `mock_dataset` file parts. When no mock files
/// are sent a placeholder mock is downloaded instead.
pub async fn create_dataset_from_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Dataset>), ApiError> {
    let mut name = String::new();
    let mut description = String::new();
    let mut files = Vec::new();
    let mut mock_files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart request: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => name = read_text_part(field).await?,
            "description" => description = read_text_part(field).await?,
            "dataset" => files.push(read_file_part(field).await?),
            "mock_dataset" => mock_files.push(read_file_part(field).await?),
            other => debug!("ignoring unknown multipart field '{}'", other),
        }
    }

    let name = validate_name(&name)?;
    validate_description(&description)?;

    let dataset = dataset_service(&state)
        .await?
        .create_dataset(&name, &description, files, mock_files)
        .await?;
    Ok((StatusCode::CREATED, Json(dataset)))
}

async fn read_text_part(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart field: {}", e)))
}

async fn read_file_part(field: Field<'_>) -> Result<UploadedFile, ApiError> {
    let name = field
        .file_name()
        .map(str::to_string)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "upload.bin".to_string());
    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read uploaded file: {}", e)))?;
    Ok(UploadedFile {
        name,
        bytes: bytes.to_vec(),
    })
}

#[derive(Debug, Deserialize)]
pub struct ImportStoreRequest {
    pub url: String,
    pub name: String,
    pub access_token: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// POST /api/v1/datasets/import-from-store - export a store's products as a dataset
pub async fn import_dataset_from_store(
    State(state): State<AppState>,
    Json(body): Json<ImportStoreRequest>,
) -> Result<(StatusCode, Json<Dataset>), ApiError> {
    let name = validate_name(&body.name)?;
    let access_token = body.access_token.trim();
    if access_token.is_empty() {
        return Err(ApiError::bad_request("Store access token is required"));
    }
    let url = Url::parse(body.url.trim())
        .map_err(|e| ApiError::bad_request(format!("Invalid store URL: {}", e)))?;

    let dataset = store_service(&state)
        .await?
        .import_dataset(url, &name, access_token, body.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(dataset)))
}

/// PUT /api/v1/datasets/sync-store-dataset/:dataset_id - refresh from the store source
pub async fn sync_store_dataset(
    State(state): State<AppState>,
    Path(dataset_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(
        store_service(&state).await?.sync_dataset(dataset_id).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateDatasetRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// PUT /api/v1/datasets/update/:dataset_id - rename a dataset or edit its description
pub async fn update_dataset(
    State(state): State<AppState>,
    Path(dataset_id): Path<Uuid>,
    Json(body): Json<UpdateDatasetRequest>,
) -> Result<Json<Dataset>, ApiError> {
    let name = match body.name.as_deref() {
        Some(name) => Some(validate_name(name)?),
        None => None,
    };
    if let Some(description) = body.description.as_deref() {
        validate_description(description)?;
    }

    let update = DatasetUpdate {
        uid: dataset_id,
        name,
        summary: body.description,
        auto_approval: None,
    };
    Ok(Json(
        dataset_service(&state).await?.update_dataset(update).await?,
    ))
}

/// DELETE /api/v1/datasets/:dataset_id - delete a dataset
///
/// The path segment carries the dataset name, which is unique per workspace.
pub async fn delete_dataset(
    State(state): State<AppState>,
    Path(dataset_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(
        dataset_service(&state)
            .await?
            .delete_dataset(&dataset_id)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct DatasetFilesQuery {
    pub dataset_type: Option<DatasetSide>,
}

/// GET /api/v1/datasets/:dataset_id/files - preview the file tree of one side
pub async fn get_dataset_files(
    State(state): State<AppState>,
    Path(dataset_id): Path<Uuid>,
    Query(query): Query<DatasetFilesQuery>,
) -> Result<Json<DatasetFilesResponse>, ApiError> {
    let side = query.dataset_type.unwrap_or(DatasetSide::Private);
    Ok(Json(
        dataset_service(&state)
            .await?
            .get_dataset_files(dataset_id, side)
            .await?,
    ))
}

/// GET /api/v1/datasets/:dataset_id/private - download the primary private file
pub async fn download_dataset_private(
    State(state): State<AppState>,
    Path(dataset_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    dataset_service(&state)
        .await?
        .download_private_file(dataset_id)
        .await
}

/// GET /api/v1/datasets/open-local-directory/:dataset_id - reveal in the file manager
pub async fn open_local_directory(
    State(state): State<AppState>,
    Path(dataset_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(
        dataset_service(&state)
            .await?
            .open_local_directory(dataset_id)
            .await?,
    ))
}
