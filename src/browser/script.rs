use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::EngineError;

/// Loads the source of scripts injected into audited pages
pub struct ScriptLoader {
    client: Client,
}

impl ScriptLoader {
    /// Create a new script loader
    pub fn new() -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| EngineError::ScriptLoad(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Load a script from an `http(s)://` URL or a local file path
    pub async fn load(&self, location: &str) -> Result<String, EngineError> {
        let source = if location.starts_with("http://") || location.starts_with("https://") {
            self.fetch(location).await?
        } else {
            Self::read_file(Path::new(location)).await?
        };

        if source.trim().is_empty() {
            return Err(EngineError::ScriptLoad(format!("script at {} is empty", location)));
        }

        info!("Loaded audit script from {} ({} bytes)", location, source.len());
        Ok(source)
    }

    async fn fetch(&self, url: &str) -> Result<String, EngineError> {
        debug!("Fetching script: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EngineError::ScriptLoad(format!("failed to fetch {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(EngineError::ScriptLoad(format!(
                "failed to fetch {}: HTTP {}",
                url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| EngineError::ScriptLoad(format!("failed to read {}: {}", url, e)))
    }

    async fn read_file(path: &Path) -> Result<String, EngineError> {
        debug!("Reading script: {}", path.display());

        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| EngineError::ScriptLoad(format!("failed to read {}: {}", path.display(), e)))
    }
}
