//! Fixed list of source URLs from configuration

use async_trait::async_trait;
use tracing::warn;

use super::SourceDiscovery;
use crate::errors::{AppError, AppResult};
use crate::utils::url::UrlUtils;

#[derive(Debug, Clone)]
pub struct StaticDiscovery {
    urls: Vec<String>,
}

impl StaticDiscovery {
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls }
    }
}

#[async_trait]
impl SourceDiscovery for StaticDiscovery {
    fn name(&self) -> &str {
        "static"
    }

    async fn discover(&self) -> AppResult<Vec<String>> {
        let mut urls = Vec::with_capacity(self.urls.len());
        for url in &self.urls {
            let url = url.trim();
            if !UrlUtils::is_valid(url) {
                warn!(
                    "Ignoring invalid static source URL: {}",
                    UrlUtils::obfuscate_credentials(url)
                );
                continue;
            }
            if !urls.iter().any(|known| known == url) {
                urls.push(url.to_string());
            }
        }

        if urls.is_empty() {
            return Err(AppError::discovery_parse(
                "static discovery has no usable URLs configured",
            ));
        }
        Ok(urls)
    }
}
