// Request-scoped services wrapping the registry stores
pub mod dataset_service;
pub mod job_service;
pub mod store_import;
pub mod trusted_datasites;

pub use dataset_service::DatasetService;
pub use job_service::JobService;
pub use store_import::StoreImportService;
pub use trusted_datasites::TrustedDatasitesService;

use std::path::PathBuf;

use crate::error::ApiError;

/// Open a workspace path in the operator's file manager. Spawning the
/// opener is blocking, so it runs off the async runtime.
pub(crate) async fn open_in_file_manager(path: PathBuf) -> Result<(), ApiError> {
    let display = path.display().to_string();
    tokio::task::spawn_blocking(move || open::that(path))
        .await
        .map_err(|e| ApiError::internal(format!("Failed to open {}: {}", display, e)))?
        .map_err(|e| ApiError::internal(format!("Failed to open {}: {}", display, e)))?;
    Ok(())
}
