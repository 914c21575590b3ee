// Shared test harness. Not every test binary uses every helper.
#![allow(dead_code)]

use anyhow::{Context, Result};
use tempfile::TempDir;

use datasite_dashboard::config::{
    AppConfig, Environment, MockDataConfig, ServerConfig, WorkspaceConfig,
};
use datasite_dashboard::registry::RegistryClient;
use datasite_dashboard::{app, AppState};

pub struct TestServer {
    pub base_url: String,
    pub config: AppConfig,
    // Keeps the throwaway workspace alive for the duration of the test
    _workspace: TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Direct registry access for seeding and verifying workspace state
    pub fn registry(&self) -> Result<RegistryClient> {
        RegistryClient::connect(&self.config.workspace).context("failed to open test workspace")
    }
}

/// Start an in-process server on an ephemeral port with a fresh workspace.
pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with(|_| {}).await
}

pub async fn spawn_server_with(tweak: impl FnOnce(&mut AppConfig)) -> Result<TestServer> {
    let workspace = TempDir::new().context("failed to create workspace dir")?;

    let mut config = AppConfig {
        environment: Environment::Development,
        server: ServerConfig {
            port: 0,
            static_dir: None,
            max_upload_bytes: 64 * 1024 * 1024,
        },
        workspace: WorkspaceConfig {
            root: workspace.path().to_path_buf(),
            email: "owner@test.local".to_string(),
        },
        mock_data: MockDataConfig {
            // Unroutable so tests fail fast unless they point this at a
            // local stand-in via spawn_mock_source
            url: "http://127.0.0.1:9/mock.csv".to_string(),
            timeout_secs: 2,
        },
    };
    tweak(&mut config);

    let state = AppState::new(config.clone());
    let router = app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test listener")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(TestServer {
        base_url: format!("http://{}", addr),
        config,
        _workspace: workspace,
    })
}

/// Serve a fixed CSV body on an ephemeral port, returning its URL. Used as
/// the mock fallback source in create/import tests.
pub async fn spawn_mock_source(body: &'static str) -> Result<String> {
    use axum::routing::get;
    use axum::Router;

    let router = Router::new().route("/mock.csv", get(move || async move { body }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind mock source listener")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://{}/mock.csv", addr))
}
