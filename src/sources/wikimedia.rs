//! Wikimedia scraping discovery
//!
//! Two steps:
//! 1. A MediaWiki `prop=images` query lists the file titles used on an article.
//! 2. Each file's description page is scraped for the "full media" link, which
//!    points at the original upload.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::SourceDiscovery;
use crate::errors::{AppError, AppResult};
use crate::utils::url::UrlUtils;

/// Raster types the resize pipeline can decode
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

const FULL_MEDIA_PATTERN: &str = r#"fullMedia.+?href="([^"]+)""#;

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: QueryBody,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    pages: BTreeMap<String, QueryPage>,
}

#[derive(Debug, Deserialize)]
struct QueryPage {
    #[serde(default)]
    images: Vec<PageImage>,
}

#[derive(Debug, Deserialize)]
struct PageImage {
    title: String,
}

pub struct WikimediaDiscovery {
    http_client: Client,
    search_url: String,
    file_root_url: String,
    full_media: Regex,
}

impl WikimediaDiscovery {
    pub fn new(http_client: Client, search_url: String, file_root_url: String) -> AppResult<Self> {
        let full_media = Regex::new(FULL_MEDIA_PATTERN)
            .map_err(|e| AppError::internal(format!("invalid full media pattern: {e}")))?;

        Ok(Self {
            http_client,
            search_url,
            file_root_url,
            full_media,
        })
    }

    async fn get_text(&self, url: &str) -> AppResult<String> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch(UrlUtils::obfuscate_credentials(url), e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::fetch(
                UrlUtils::obfuscate_credentials(url),
                format!("HTTP {}", response.status()),
            ));
        }

        Ok(response.text().await?)
    }

    /// Description page URL for a file title such as `File:Mountain lake.jpg`
    pub fn file_page_url(&self, title: &str) -> String {
        format!("{}{}", self.file_root_url, title.replace(' ', "_"))
    }

    /// Pull the original upload URL out of a file description page
    pub fn extract_full_media_url(&self, page_url: &str, html: &str) -> Option<String> {
        let href = self.full_media.captures(html)?.get(1)?.as_str();
        UrlUtils::absolutize(page_url, href)
    }
}

/// File titles from a `prop=images` query response, filtered to accepted types
pub fn parse_image_titles(body: &str) -> AppResult<Vec<String>> {
    let response: QueryResponse = serde_json::from_str(body)
        .map_err(|e| AppError::discovery_parse(format!("unexpected search response: {e}")))?;

    let titles = response
        .query
        .pages
        .into_values()
        .flat_map(|page| page.images)
        .map(|image| image.title)
        .filter(|title| is_accepted_title(title))
        .collect();

    Ok(titles)
}

fn is_accepted_title(title: &str) -> bool {
    UrlUtils::extension(title)
        .is_some_and(|extension| ACCEPTED_EXTENSIONS.contains(&extension.as_str()))
}

#[async_trait]
impl SourceDiscovery for WikimediaDiscovery {
    fn name(&self) -> &str {
        "wikimedia"
    }

    async fn discover(&self) -> AppResult<Vec<String>> {
        let body = self.get_text(&self.search_url).await?;
        let titles = parse_image_titles(&body)?;
        debug!("Wikimedia search returned {} candidate files", titles.len());

        let mut urls: Vec<String> = Vec::with_capacity(titles.len());
        for title in &titles {
            let page_url = self.file_page_url(title);

            let html = match self.get_text(&page_url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("Skipping {}: {}", title, e);
                    continue;
                }
            };

            match self.extract_full_media_url(&page_url, &html) {
                Some(url) if !urls.contains(&url) => urls.push(url),
                Some(_) => {}
                None => warn!("No full media link on {}", page_url),
            }
        }

        if urls.is_empty() {
            return Err(AppError::discovery_parse(
                "no usable image URLs found on Wikimedia",
            ));
        }

        info!(
            "Wikimedia discovery found {} images from {} candidates",
            urls.len(),
            titles.len()
        );
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovery() -> WikimediaDiscovery {
        WikimediaDiscovery::new(
            Client::new(),
            "https://en.wikipedia.org/w/api.php".to_string(),
            "https://commons.wikimedia.org/wiki/".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_image_titles_filters_types() {
        let body = r#"{
            "batchcomplete": "",
            "query": {
                "pages": {
                    "17": {
                        "pageid": 17,
                        "title": "Landscape",
                        "images": [
                            {"ns": 6, "title": "File:Mountain lake.jpg"},
                            {"ns": 6, "title": "File:Commons-logo.svg"},
                            {"ns": 6, "title": "File:Timelapse.webm"},
                            {"ns": 6, "title": "File:Dunes.PNG"}
                        ]
                    }
                }
            }
        }"#;

        assert_eq!(
            parse_image_titles(body).unwrap(),
            vec!["File:Mountain lake.jpg", "File:Dunes.PNG"]
        );
    }

    #[test]
    fn test_parse_image_titles_without_images() {
        let body = r#"{"query": {"pages": {"-1": {"missing": ""}}}}"#;
        assert!(parse_image_titles(body).unwrap().is_empty());
    }

    #[test]
    fn test_parse_image_titles_schema_mismatch() {
        assert!(matches!(
            parse_image_titles(r#"{"error": {"code": "badvalue"}}"#),
            Err(AppError::DiscoveryParse { .. })
        ));
        assert!(parse_image_titles("<html></html>").is_err());
    }

    #[test]
    fn test_file_page_url_replaces_spaces() {
        assert_eq!(
            discovery().file_page_url("File:Mountain lake at dawn.jpg"),
            "https://commons.wikimedia.org/wiki/File:Mountain_lake_at_dawn.jpg"
        );
    }

    #[test]
    fn test_extract_full_media_url() {
        let html = r#"<div class="fullImageLink" id="file"><a href="/wiki/x">preview</a></div>
            <div class="fullMedia"><p><a href="//upload.wikimedia.org/wikipedia/commons/a/ab/Mountain_lake.jpg" class="internal">Original file</a></p></div>"#;

        assert_eq!(
            discovery()
                .extract_full_media_url("https://commons.wikimedia.org/wiki/File:Mountain_lake.jpg", html)
                .as_deref(),
            Some("https://upload.wikimedia.org/wikipedia/commons/a/ab/Mountain_lake.jpg")
        );
    }

    #[test]
    fn test_extract_full_media_url_missing() {
        assert_eq!(
            discovery().extract_full_media_url(
                "https://commons.wikimedia.org/wiki/File:X.jpg",
                "<html><body>No file</body></html>"
            ),
            None
        );
    }
}
