use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header;
use axum::response::Response;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::MockDataConfig;
use crate::error::ApiError;
use crate::models::{
    Dataset, DatasetFilesResponse, DatasetSide, ListDatasetsResponse, MessageResponse,
};
use crate::preview::PreviewBuilder;
use crate::registry::dataset::{dir_size, first_file};
use crate::registry::{CreateDataset, DatasetRecord, DatasetUpdate, RegistryClient};
use crate::staging::{fetch_mock_data, StagedUpload, UploadedFile};

use super::open_in_file_manager;

/// Dataset operations: browsing, upload-based creation, metadata updates
/// and the private-file download.
pub struct DatasetService {
    client: Arc<RegistryClient>,
    http: reqwest::Client,
    mock_data: MockDataConfig,
}

impl DatasetService {
    pub fn new(
        client: Arc<RegistryClient>,
        http: reqwest::Client,
        mock_data: MockDataConfig,
    ) -> Self {
        Self {
            client,
            http,
            mock_data,
        }
    }

    pub async fn list_datasets(&self) -> Result<ListDatasetsResponse, ApiError> {
        let mut datasets = Vec::new();
        for record in self.client.datasets().get_all()? {
            datasets.push(annotate_record(&self.client, record)?);
        }
        Ok(ListDatasetsResponse { datasets })
    }

    /// Create a dataset from uploaded files. When no mock files were
    /// uploaded, the configured fallback mock is downloaded instead; a
    /// dataset must never land without a mock side.
    pub async fn create_dataset(
        &self,
        name: &str,
        description: &str,
        files: Vec<UploadedFile>,
        mock_files: Vec<UploadedFile>,
    ) -> Result<Dataset, ApiError> {
        let needs_mock_fallback = mock_files.is_empty();
        let staged = StagedUpload::materialize(&files, &mock_files, description).await?;

        if needs_mock_fallback {
            // Name the fetched mock after the first uploaded file so both
            // sides of the dataset line up
            let mock_name = files
                .first()
                .map(|f| base_name(&f.name))
                .unwrap_or_else(|| "mock.csv".to_string());
            fetch_mock_data(
                &self.http,
                &self.mock_data.url,
                &staged.mock_dir().join(mock_name),
            )
            .await?;
        }

        let auto_approval = self.client.trusted().load()?;
        let record = self.client.datasets().create(CreateDataset {
            name,
            summary: description,
            files_dir: &staged.real_dir(),
            mock_dir: &staged.mock_dir(),
            description_file: &staged.description_file(),
            auto_approval,
        })?;
        info!("dataset '{}' created by upload", record.name);
        annotate_record(&self.client, record)
    }

    pub async fn update_dataset(&self, update: DatasetUpdate) -> Result<Dataset, ApiError> {
        let record = self.client.datasets().update(update)?;
        annotate_record(&self.client, record)
    }

    pub async fn delete_dataset(&self, name: &str) -> Result<MessageResponse, ApiError> {
        if !self.client.datasets().delete(name)? {
            return Err(ApiError::not_found(format!(
                "Unable to delete dataset '{}'",
                name
            )));
        }
        Ok(MessageResponse::new(format!(
            "Dataset {} deleted successfully",
            name
        )))
    }

    /// Preview one side of a dataset's file tree
    pub async fn get_dataset_files(
        &self,
        uid: Uuid,
        side: DatasetSide,
    ) -> Result<DatasetFilesResponse, ApiError> {
        let record = self.get_record(uid)?;
        let store = self.client.datasets();
        let dir = match side {
            DatasetSide::Private => store.private_dir(&record),
            DatasetSide::Mock => store.mock_dir(&record),
        };
        let preview = PreviewBuilder::dataset().scan(&dir)?;
        Ok(DatasetFilesResponse {
            data_dir: preview.dir.display().to_string(),
            files: preview.files,
            dataset_type: side,
        })
    }

    /// Stream the representative private file as an attachment named after
    /// the dataset
    pub async fn download_private_file(&self, uid: Uuid) -> Result<Response, ApiError> {
        let record = self.get_record(uid)?;
        let path = first_file(&self.client.datasets().private_dir(&record)).ok_or_else(|| {
            ApiError::not_found(format!("Private file not found for dataset '{}'", uid))
        })?;
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to open private file: {}", e)))?;

        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let filename = format!("{}{}", record.name, extension);
        debug!("streaming {} as {}", path.display(), filename);

        Response::builder()
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header(
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            )
            .body(Body::from_stream(ReaderStream::new(file)))
            .map_err(|e| ApiError::internal(format!("Failed to build download response: {}", e)))
    }

    pub async fn open_local_directory(&self, uid: Uuid) -> Result<MessageResponse, ApiError> {
        let record = self.get_record(uid)?;
        let dir = self.client.datasets().root_dir(&record);
        if !dir.is_dir() {
            return Err(ApiError::not_found(format!(
                "Dataset directory not found for '{}'",
                uid
            )));
        }
        open_in_file_manager(dir).await?;
        Ok(MessageResponse::new(format!(
            "Opened local directory for dataset {}",
            uid
        )))
    }

    fn get_record(&self, uid: Uuid) -> Result<DatasetRecord, ApiError> {
        self.client
            .datasets()
            .get(uid)?
            .ok_or_else(|| ApiError::not_found(format!("Dataset with UID '{}' not found", uid)))
    }
}

/// Turn a registry record into its wire form: attach representative file
/// paths, recursive sizes, the readme and any provenance entry
pub(crate) fn annotate_record(
    client: &RegistryClient,
    record: DatasetRecord,
) -> Result<Dataset, ApiError> {
    let store = client.datasets();
    let private_dir = store.private_dir(&record);
    let mock_dir = store.mock_dir(&record);
    let source = client.sources().find(record.uid)?;
    let readme = std::fs::read_to_string(store.readme_file(&record)).ok();

    Ok(Dataset {
        uid: record.uid,
        name: record.name,
        summary: record.summary,
        created_by: record.created_by,
        created_at: record.created_at,
        updated_at: record.updated_at,
        tags: record.tags,
        auto_approval: record.auto_approval,
        private: first_file(&private_dir)
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        private_size: dir_size(&private_dir),
        mock: first_file(&mock_dir)
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        mock_size: dir_size(&mock_dir),
        readme,
        source,
    })
}

fn base_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mock.csv".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkspaceConfig;
    use crate::staging::UploadedFile;
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> DatasetService {
        let client = RegistryClient::connect(&WorkspaceConfig {
            root: dir.path().to_path_buf(),
            email: "owner@site.org".to_string(),
        })
        .unwrap();
        DatasetService::new(
            Arc::new(client),
            reqwest::Client::new(),
            MockDataConfig {
                // Never fetched in these tests; uploads always carry mocks
                url: "http://127.0.0.1:9/unreachable.csv".to_string(),
                timeout_secs: 1,
            },
        )
    }

    fn part(name: &str, bytes: &[u8]) -> UploadedFile {
        UploadedFile {
            name: name.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn create_with_uploaded_mock_annotates_sizes() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);

        let dataset = service
            .create_dataset(
                "sales",
                "Quarterly sales",
                vec![part("sales/train.csv", b"a,b\n1,2\n")],
                vec![part("train.csv", b"a,b\n9,9\n")],
            )
            .await
            .unwrap();

        assert_eq!(dataset.name, "sales");
        assert_eq!(dataset.private_size, 8);
        assert_eq!(dataset.mock_size, 8);
        assert!(dataset.private.ends_with("train.csv"));
        assert_eq!(dataset.readme.as_deref(), Some("Quarterly sales"));
        assert!(dataset.source.is_none());
    }

    #[tokio::test]
    async fn create_duplicate_is_field_conflict() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);

        service
            .create_dataset(
                "sales",
                "",
                vec![part("train.csv", b"x\n")],
                vec![part("train.csv", b"y\n")],
            )
            .await
            .unwrap();
        let err = service
            .create_dataset(
                "sales",
                "",
                vec![part("train.csv", b"x\n")],
                vec![part("train.csv", b"y\n")],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::FieldConflict { loc: "name", .. }));
    }

    #[tokio::test]
    async fn files_preview_covers_requested_side() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        let dataset = service
            .create_dataset(
                "sales",
                "",
                vec![part("train.csv", b"private\n")],
                vec![part("train.csv", b"mock\n")],
            )
            .await
            .unwrap();

        let private = service
            .get_dataset_files(dataset.uid, DatasetSide::Private)
            .await
            .unwrap();
        assert_eq!(private.files["train.csv"], "private\n");
        assert_eq!(private.dataset_type, DatasetSide::Private);

        let mock = service
            .get_dataset_files(dataset.uid, DatasetSide::Mock)
            .await
            .unwrap();
        assert_eq!(mock.files["train.csv"], "mock\n");
    }

    #[tokio::test]
    async fn unknown_dataset_is_not_found() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        let err = service
            .get_dataset_files(Uuid::new_v4(), DatasetSide::Private)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
