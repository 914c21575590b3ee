use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::error;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::registry::RegistryClient;

/// Shared application state handed to every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    config: AppConfig,
    http: reqwest::Client,
    registry: RwLock<Option<Arc<RegistryClient>>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        // Outbound calls go to operator-supplied origins, so they must not
        // hang a request forever
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.mock_data.timeout_secs))
            .build()
            .expect("failed to build HTTP client");
        Self {
            inner: Arc::new(Inner {
                config,
                http,
                registry: RwLock::new(None),
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// Registry session, created on first use and cached. A failed creation
    /// leaves nothing cached, so the next request simply retries.
    pub async fn registry(&self) -> Result<Arc<RegistryClient>, ApiError> {
        {
            let cached = self.inner.registry.read().await;
            if let Some(client) = cached.as_ref() {
                return Ok(client.clone());
            }
        }

        let mut slot = self.inner.registry.write().await;
        // Double-check: another request may have connected while we waited
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }
        match RegistryClient::connect(&self.inner.config.workspace) {
            Ok(client) => {
                let client = Arc::new(client);
                *slot = Some(client.clone());
                Ok(client)
            }
            Err(e) => {
                error!("failed to open registry session: {}", e);
                Err(ApiError::internal(format!(
                    "Failed to open registry session: {}",
                    e
                )))
            }
        }
    }
}
