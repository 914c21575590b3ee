use tracing::info;

use crate::config::WorkspaceConfig;
use crate::sources::SourceStore;
use crate::trust::TrustStore;

use super::dataset::DatasetStore;
use super::job::JobStore;
use super::workspace::Workspace;
use super::RegistryError;

/// One session against the datasite workspace, bundling the stores the
/// dashboard works with. Connecting ensures the workspace layout exists.
#[derive(Debug)]
pub struct RegistryClient {
    workspace: Workspace,
    email: String,
    datasets: DatasetStore,
    jobs: JobStore,
}

impl RegistryClient {
    pub fn connect(config: &WorkspaceConfig) -> Result<Self, RegistryError> {
        let workspace = Workspace::open(&config.root)?;
        info!(
            "registry session for {} (workspace: {})",
            config.email,
            workspace.root().display()
        );
        Ok(Self {
            datasets: DatasetStore::new(workspace.clone(), config.email.clone()),
            jobs: JobStore::new(workspace.clone()),
            email: config.email.clone(),
            workspace,
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// The dashboard always runs as the datasite owner
    pub fn is_admin(&self) -> bool {
        true
    }

    pub fn host_datasite_url(&self) -> String {
        format!("datasite://{}", self.email)
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn datasets(&self) -> &DatasetStore {
        &self.datasets
    }

    pub fn jobs(&self) -> &JobStore {
        &self.jobs
    }

    pub fn sources(&self) -> SourceStore {
        SourceStore::new(self.workspace.sources_file())
    }

    pub fn trusted(&self) -> TrustStore {
        TrustStore::new(self.workspace.trusted_datasites_file())
    }
}
