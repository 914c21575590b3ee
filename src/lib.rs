pub mod config;
pub mod error;
pub mod handlers;
pub mod lockfile;
pub mod models;
pub mod preview;
pub mod registry;
pub mod services;
pub mod sources;
pub mod staging;
pub mod state;
pub mod trust;

pub use state::AppState;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;

/// Build the full application router: health check, the versioned API and,
/// when configured, the exported frontend as a static fallback.
pub fn app(state: AppState) -> Router {
    let config = state.config();
    let mut router = Router::new()
        .route("/api/health", get(health))
        .nest("/api/v1", api_v1_routes())
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http());

    if let Some(static_dir) = config.server.static_dir.as_ref().filter(|d| d.is_dir()) {
        router = router.fallback_service(ServeDir::new(static_dir));
    }

    router.with_state(state)
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(dataset_routes())
        .merge(job_routes())
        .merge(trusted_datasite_routes())
        .merge(account_routes())
}

fn dataset_routes() -> Router<AppState> {
    use axum::routing::{delete, post, put};
    use handlers::datasets;

    Router::new()
        // Collection-level operations
        .route("/datasets", get(datasets::list_datasets))
        .route(
            "/datasets/create-from-file",
            post(datasets::create_dataset_from_file),
        )
        .route(
            "/datasets/import-from-store",
            post(datasets::import_dataset_from_store),
        )
        // Single-dataset operations
        .route(
            "/datasets/sync-store-dataset/:dataset_id",
            put(datasets::sync_store_dataset),
        )
        .route("/datasets/update/:dataset_id", put(datasets::update_dataset))
        .route(
            "/datasets/open-local-directory/:dataset_id",
            get(datasets::open_local_directory),
        )
        .route("/datasets/:dataset_id", delete(datasets::delete_dataset))
        .route("/datasets/:dataset_id/files", get(datasets::get_dataset_files))
        .route(
            "/datasets/:dataset_id/private",
            get(datasets::download_dataset_private),
        )
}

fn job_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::jobs;

    Router::new()
        .route("/jobs", get(jobs::list_jobs).delete(jobs::delete_all_jobs))
        // Lifecycle transitions
        .route("/jobs/approve/:job_uid", post(jobs::approve_job))
        .route("/jobs/reject/:job_uid", post(jobs::reject_job))
        .route("/jobs/run/:job_uid", post(jobs::run_job))
        .route("/jobs/rerun/:job_uid", post(jobs::rerun_job))
        // Inspection
        .route("/jobs/logs/:job_uid", get(jobs::get_job_logs))
        .route("/jobs/code/:job_uid", get(jobs::get_job_code))
        .route("/jobs/output/:job_uid", get(jobs::get_job_output))
        .route("/jobs/open-code/:job_uid", get(jobs::open_job_code))
        .route("/jobs/:job_uid", get(jobs::get_job).delete(jobs::delete_job))
}

fn trusted_datasite_routes() -> Router<AppState> {
    use handlers::trusted_datasites;

    Router::new().route(
        "/trusted-datasites",
        get(trusted_datasites::get_trusted_datasites)
            .post(trusted_datasites::set_trusted_datasites),
    )
}

fn account_routes() -> Router<AppState> {
    use handlers::account;

    Router::new().route("/account", get(account::get_account_info))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// GET /api/health - liveness check
async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
