use axum::extract::State;
use axum::Json;

use crate::error::ApiError;
use crate::models::AccountInfoResponse;
use crate::state::AppState;

/// GET /api/v1/account - identity of the datasite owner this server runs as
pub async fn get_account_info(
    State(state): State<AppState>,
) -> Result<Json<AccountInfoResponse>, ApiError> {
    let registry = state.registry().await?;
    Ok(Json(AccountInfoResponse {
        email: registry.email().to_string(),
        is_admin: registry.is_admin(),
        host_datasite_url: registry.host_datasite_url(),
    }))
}
