use std::sync::Arc;

use tracing::{error, info};

use crate::error::ApiError;
use crate::lockfile::FileLock;
use crate::models::{ListTrustedDatasitesResponse, MessageResponse};
use crate::registry::{DatasetUpdate, RegistryClient};
use crate::trust::normalize_list;

/// Manages the auto-approval list and keeps every dataset's metadata in
/// step with it.
pub struct TrustedDatasitesService {
    client: Arc<RegistryClient>,
}

impl TrustedDatasitesService {
    pub fn new(client: Arc<RegistryClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<ListTrustedDatasitesResponse, ApiError> {
        Ok(ListTrustedDatasitesResponse {
            datasites: self.client.trusted().load()?,
        })
    }

    /// Replace the list wholesale and cascade it into every dataset. The
    /// advisory lock covers both steps so concurrent updates cannot
    /// interleave half-applied lists.
    pub async fn update(&self, datasites: Vec<String>) -> Result<MessageResponse, ApiError> {
        let store = self.client.trusted();
        let _guard = FileLock::acquire(&store.lock_path()).map_err(|e| {
            error!("failed to lock trusted datasites file: {}", e);
            ApiError::internal("Failed to lock trusted datasites file")
        })?;

        let datasites = normalize_list(&datasites);
        store.save(&datasites)?;
        self.apply_to_datasets(&datasites)?;
        info!("trusted datasites list updated ({} entries)", datasites.len());
        Ok(MessageResponse::new(format!(
            "Auto-approve list updated with {} emails",
            datasites.len()
        )))
    }

    /// Per-dataset failures are logged and skipped so one bad record cannot
    /// wedge the whole update.
    fn apply_to_datasets(&self, datasites: &[String]) -> Result<(), ApiError> {
        for record in self.client.datasets().get_all()? {
            let update = DatasetUpdate {
                uid: record.uid,
                auto_approval: Some(datasites.to_vec()),
                ..Default::default()
            };
            if let Err(e) = self.client.datasets().update(update) {
                error!(
                    "failed to update auto-approval for dataset '{}': {}",
                    record.name, e
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkspaceConfig;
    use crate::registry::CreateDataset;
    use std::fs;
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> TrustedDatasitesService {
        let client = RegistryClient::connect(&WorkspaceConfig {
            root: dir.path().to_path_buf(),
            email: "owner@site.org".to_string(),
        })
        .unwrap();
        TrustedDatasitesService::new(Arc::new(client))
    }

    fn seed_dataset(service: &TrustedDatasitesService, name: &str) {
        let staging = TempDir::new().unwrap();
        let real = staging.path().join("real");
        let mock = staging.path().join("mock");
        fs::create_dir_all(&real).unwrap();
        fs::create_dir_all(&mock).unwrap();
        fs::write(real.join("x.csv"), "1\n").unwrap();
        let readme = staging.path().join("README.md");
        fs::write(&readme, "").unwrap();
        service
            .client
            .datasets()
            .create(CreateDataset {
                name,
                summary: "",
                files_dir: &real,
                mock_dir: &mock,
                description_file: &readme,
                auto_approval: Vec::new(),
            })
            .unwrap();
    }

    #[tokio::test]
    async fn update_normalizes_and_cascades() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        seed_dataset(&service, "sales");
        seed_dataset(&service, "crops");

        let response = service
            .update(vec![
                "alice@site-a.org".to_string(),
                "  ".to_string(),
                " bob@site-b.org ".to_string(),
            ])
            .await
            .unwrap();
        assert_eq!(response.message, "Auto-approve list updated with 2 emails");

        let expected = vec!["alice@site-a.org".to_string(), "bob@site-b.org".to_string()];
        assert_eq!(service.client.trusted().load().unwrap(), expected);
        for record in service.client.datasets().get_all().unwrap() {
            assert_eq!(record.auto_approval, expected);
        }
    }

    #[tokio::test]
    async fn list_starts_empty() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        assert!(service.list().await.unwrap().datasites.is_empty());
    }
}
