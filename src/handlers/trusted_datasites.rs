use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::error::ApiError;
use crate::models::{ListTrustedDatasitesResponse, MessageResponse};
use crate::services::TrustedDatasitesService;
use crate::state::AppState;

/// GET /api/v1/trusted-datasites - list datasite emails whose jobs are auto-approved
pub async fn get_trusted_datasites(
    State(state): State<AppState>,
) -> Result<Json<ListTrustedDatasitesResponse>, ApiError> {
    let service = TrustedDatasitesService::new(state.registry().await?);
    Ok(Json(service.list().await?))
}

#[derive(Debug, Deserialize)]
pub struct SetTrustedDatasitesRequest {
    pub datasites: Vec<String>,
}

/// POST /api/v1/trusted-datasites - replace the list and cascade it to every dataset
pub async fn set_trusted_datasites(
    State(state): State<AppState>,
    Json(body): Json<SetTrustedDatasitesRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let service = TrustedDatasitesService::new(state.registry().await?);
    Ok(Json(service.update(body.datasites).await?))
}
