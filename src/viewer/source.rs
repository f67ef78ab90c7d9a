use super::ViewerError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Fetches structure text from a URL.
#[async_trait]
pub trait StructureSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ViewerError>;
}

/// Plain HTTP GET, with no authentication attached.
#[derive(Debug, Clone, Default)]
pub struct HttpStructureSource {
    http: reqwest::Client,
}

impl HttpStructureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, ViewerError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ViewerError::Fetch(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl StructureSource for HttpStructureSource {
    async fn fetch(&self, url: &str) -> Result<String, ViewerError> {
        debug!(url, "Fetching structure");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ViewerError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let reason = status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_str().to_string());
            return Err(ViewerError::Fetch(reason));
        }

        response
            .text()
            .await
            .map_err(|e| ViewerError::Fetch(e.to_string()))
    }
}
