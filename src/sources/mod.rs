//! Source discovery collaborators
//!
//! A [`SourceDiscovery`] produces the full list of source image URLs the
//! pool should rotate through. How it finds them is private to each
//! implementation; the refresh loop only sees the resulting list.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

use crate::config::DiscoveryConfig;
use crate::errors::AppResult;

pub mod static_list;
pub mod wikimedia;

pub use static_list::StaticDiscovery;
pub use wikimedia::WikimediaDiscovery;

#[async_trait]
pub trait SourceDiscovery: Send + Sync {
    /// Short provider name for logs and health output
    fn name(&self) -> &str;

    /// Fetch the current list of source URLs
    ///
    /// An empty list is reported as an error, never as `Ok(vec![])`.
    async fn discover(&self) -> AppResult<Vec<String>>;
}

/// Build the discovery collaborator selected in the configuration
pub fn from_config(
    config: &DiscoveryConfig,
    http_client: Client,
) -> AppResult<Arc<dyn SourceDiscovery>> {
    let discovery: Arc<dyn SourceDiscovery> = match config {
        DiscoveryConfig::Wikimedia {
            search_url,
            file_root_url,
        } => Arc::new(WikimediaDiscovery::new(
            http_client,
            search_url.clone(),
            file_root_url.clone(),
        )?),
        DiscoveryConfig::Static { urls } => Arc::new(StaticDiscovery::new(urls.clone())),
    };
    Ok(discovery)
}
