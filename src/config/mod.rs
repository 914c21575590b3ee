use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub workspace: WorkspaceConfig,
    pub mock_data: MockDataConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory of prebuilt dashboard assets served as a fallback, if any
    pub static_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Root of the datasite workspace (datasets/, jobs/, app_data/, private/)
    pub root: PathBuf,
    /// Operator identity recorded on datasets created through the dashboard
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockDataConfig {
    /// Fallback mock dataset fetched when an upload ships no mock files
    pub url: String,
    pub timeout_secs: u64,
}

/// Public sample CSV used when an upload does not include its own mock data
pub const DEFAULT_MOCK_DATA_URL: &str =
    "https://raw.githubusercontent.com/OpenMined/datasets/refs/heads/main/enclave/organic-coop/data/part_1/crop_stock_mock_1.csv";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("DASHBOARD_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("DASHBOARD_STATIC_DIR") {
            self.server.static_dir = Some(PathBuf::from(v));
        }
        if let Ok(v) = env::var("DASHBOARD_MAX_UPLOAD_BYTES") {
            self.server.max_upload_bytes = v.parse().unwrap_or(self.server.max_upload_bytes);
        }

        // Workspace overrides
        if let Ok(v) = env::var("DASHBOARD_WORKSPACE") {
            self.workspace.root = PathBuf::from(v);
        }
        if let Ok(v) = env::var("DASHBOARD_EMAIL") {
            self.workspace.email = v;
        }

        // Mock data overrides
        if let Ok(v) = env::var("MOCK_DATA_URL") {
            self.mock_data.url = v;
        }
        if let Ok(v) = env::var("MOCK_DATA_TIMEOUT_SECS") {
            self.mock_data.timeout_secs = v.parse().unwrap_or(self.mock_data.timeout_secs);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 8000,
                static_dir: None,
                max_upload_bytes: 256 * 1024 * 1024, // 256MB
            },
            workspace: WorkspaceConfig {
                root: default_workspace_root(),
                email: default_email(),
            },
            mock_data: MockDataConfig {
                url: DEFAULT_MOCK_DATA_URL.to_string(),
                timeout_secs: 30,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 8000,
                static_dir: Some(PathBuf::from("frontend/out")),
                max_upload_bytes: 256 * 1024 * 1024, // 256MB
            },
            workspace: WorkspaceConfig {
                root: default_workspace_root(),
                email: default_email(),
            },
            mock_data: MockDataConfig {
                url: DEFAULT_MOCK_DATA_URL.to_string(),
                timeout_secs: 30,
            },
        }
    }

    /// Origins the browser dashboard calls from. In development the frontend
    /// dev server runs 5000 ports below the API; in production the dashboard
    /// is served from the API port itself.
    pub fn cors_origins(&self) -> Vec<String> {
        let frontend_port = match self.environment {
            Environment::Development => self.server.port.saturating_sub(5000),
            Environment::Production => self.server.port,
        };
        vec![
            format!("http://localhost:{}", frontend_port),
            format!("http://127.0.0.1:{}", frontend_port),
        ]
    }
}

fn default_workspace_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("datasite-dashboard")
        .join("workspace")
}

fn default_email() -> String {
    format!("{}@localhost", whoami::username())
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
