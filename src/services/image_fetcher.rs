//! Fetching raw source bytes from the origin

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

use crate::config::HttpClientConfig;
use crate::errors::{AppError, AppResult};
use crate::utils::url::UrlUtils;

/// Retrieves the raw bytes of a source image
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> AppResult<Bytes>;
}

/// Build the shared HTTP client used for origin and discovery requests
pub fn build_http_client(config: &HttpClientConfig) -> AppResult<Client> {
    Client::builder()
        .timeout(config.request_timeout)
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(AppError::from)
}

/// reqwest-backed fetcher
#[derive(Clone)]
pub struct HttpImageFetcher {
    http_client: Client,
}

impl HttpImageFetcher {
    pub fn new(http_client: Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> AppResult<Bytes> {
        let display_url = UrlUtils::obfuscate_credentials(url);
        debug!("Downloading source image: {}", display_url);

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch(&display_url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::fetch(
                &display_url,
                format!("HTTP {}", response.status()),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::fetch(&display_url, format!("failed to read body: {e}")))?;

        debug!("Downloaded {} bytes from {}", bytes.len(), display_url);
        Ok(bytes)
    }
}
