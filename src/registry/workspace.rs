use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Application namespace inside the shared workspace areas
pub const APP_NAME: &str = "datasite-dashboard";

/// Filesystem layout of one datasite workspace.
///
/// ```text
/// <root>/datasets/<name>/{dataset.yaml, private/, mock/, README.md}
/// <root>/jobs/<uid>/{job.yaml, code/, output/, logs/}
/// <root>/app_data/<app>/      state shared with the datasite owner
/// <root>/private/<app>/       state that never leaves this machine
/// ```
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Open a workspace root, creating the expected layout if missing
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let workspace = Self { root: root.into() };
        fs::create_dir_all(workspace.datasets_dir())?;
        fs::create_dir_all(workspace.jobs_dir())?;
        fs::create_dir_all(workspace.app_data_dir())?;
        fs::create_dir_all(workspace.private_dir())?;
        Ok(workspace)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn datasets_dir(&self) -> PathBuf {
        self.root.join("datasets")
    }

    pub fn jobs_dir(&self) -> PathBuf {
        self.root.join("jobs")
    }

    pub fn app_data_dir(&self) -> PathBuf {
        self.root.join("app_data").join(APP_NAME)
    }

    pub fn private_dir(&self) -> PathBuf {
        self.root.join("private").join(APP_NAME)
    }

    pub fn trusted_datasites_file(&self) -> PathBuf {
        self.app_data_dir().join("trusted_datasites.json")
    }

    pub fn sources_file(&self) -> PathBuf {
        self.private_dir().join("dataset-sources.json")
    }
}
