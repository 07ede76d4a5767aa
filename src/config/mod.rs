use anyhow::Result;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;
use duration_serde::duration;

/// Prefix for environment variable overrides, e.g. `BACKDROP_WEB__PORT=9000`
pub const ENV_PREFIX: &str = "BACKDROP_";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub http_client: HttpClientConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub images: ImageConfig,
    #[serde(default)]
    pub rotation: RotationConfig,
    #[serde(default)]
    pub precache: PrecacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Requests carry no meaningful body; anything larger is rejected
    #[serde(default = "default_max_request_body_bytes")]
    pub max_request_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    #[serde(default = "default_request_timeout", with = "duration")]
    pub request_timeout: Duration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Sizing of the in-memory image cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Finished outputs kept per catalog size
    #[serde(default = "default_entries_per_size")]
    pub entries_per_size: usize,
    /// Extra room for normalized originals
    #[serde(default = "default_normalized_entries")]
    pub normalized_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// JPEG quality for delivered images
    #[serde(default = "default_final_quality")]
    pub final_quality: u8,
    /// JPEG quality for the cached normalized original
    #[serde(default = "default_normalized_quality")]
    pub normalized_quality: u8,
    /// Longest edge of the normalized original; larger sources are downscaled
    #[serde(default = "default_normalized_max_edge")]
    pub normalized_max_edge: u32,
    /// Gaussian blur applied while normalizing, 0 disables it
    #[serde(default = "default_normalize_blur_sigma")]
    pub normalize_blur_sigma: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    #[serde(default = "default_refresh_interval", with = "duration")]
    pub refresh_interval: Duration,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

/// Which collaborator supplies the source URLs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum DiscoveryConfig {
    Wikimedia {
        #[serde(default = "default_wikimedia_search_url")]
        search_url: String,
        #[serde(default = "default_wikimedia_file_root_url")]
        file_root_url: String,
    },
    Static {
        #[serde(default)]
        urls: Vec<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecacheConfig {
    #[serde(default = "default_precache_workers")]
    pub workers: usize,
    /// Pause after every job, per worker
    #[serde(default = "default_precache_pacing", with = "duration")]
    pub pacing: Duration,
}

// Web defaults
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_max_request_body_bytes() -> usize {
    DEFAULT_MAX_REQUEST_BODY_BYTES
}

// HTTP client defaults
fn default_request_timeout() -> Duration {
    humantime::parse_duration(DEFAULT_REQUEST_TIMEOUT).unwrap_or(Duration::from_secs(30))
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

// Cache defaults
fn default_entries_per_size() -> usize {
    DEFAULT_ENTRIES_PER_SIZE
}

fn default_normalized_entries() -> usize {
    DEFAULT_NORMALIZED_ENTRIES
}

// Image defaults
fn default_final_quality() -> u8 {
    DEFAULT_FINAL_QUALITY
}

fn default_normalized_quality() -> u8 {
    DEFAULT_NORMALIZED_QUALITY
}

fn default_normalized_max_edge() -> u32 {
    DEFAULT_NORMALIZED_MAX_EDGE
}

fn default_normalize_blur_sigma() -> f32 {
    DEFAULT_NORMALIZE_BLUR_SIGMA
}

// Rotation defaults
fn default_refresh_interval() -> Duration {
    humantime::parse_duration(DEFAULT_REFRESH_INTERVAL).unwrap_or(Duration::from_secs(3600))
}

fn default_wikimedia_search_url() -> String {
    DEFAULT_WIKIMEDIA_SEARCH_URL.to_string()
}

fn default_wikimedia_file_root_url() -> String {
    DEFAULT_WIKIMEDIA_FILE_ROOT_URL.to_string()
}

// Precache defaults
fn default_precache_workers() -> usize {
    DEFAULT_PRECACHE_WORKERS
}

fn default_precache_pacing() -> Duration {
    humantime::parse_duration(DEFAULT_PRECACHE_PACING).unwrap_or(Duration::from_secs(5))
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_request_body_bytes: default_max_request_body_bytes(),
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            entries_per_size: default_entries_per_size(),
            normalized_entries: default_normalized_entries(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            final_quality: default_final_quality(),
            normalized_quality: default_normalized_quality(),
            normalized_max_edge: default_normalized_max_edge(),
            normalize_blur_sigma: default_normalize_blur_sigma(),
        }
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self::Wikimedia {
            search_url: default_wikimedia_search_url(),
            file_root_url: default_wikimedia_file_root_url(),
        }
    }
}

impl Default for PrecacheConfig {
    fn default() -> Self {
        Self {
            workers: default_precache_workers(),
            pacing: default_precache_pacing(),
        }
    }
}

impl CacheConfig {
    /// Total cache capacity for a catalog with `size_count` entries
    pub fn capacity_for(&self, size_count: usize) -> usize {
        self.entries_per_size
            .saturating_mul(size_count)
            .saturating_add(self.normalized_entries)
    }
}

impl Config {
    /// Layer defaults, the TOML file (if present) and `BACKDROP_*` env overrides
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if !std::path::Path::new(config_file).exists() {
            info!("Config file {} not found, using defaults", config_file);
        }

        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        config.validate().map_err(|e| anyhow::anyhow!(e))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.precache.workers == 0 {
            return Err("precache.workers must be at least 1".to_string());
        }
        if self.cache.entries_per_size == 0 {
            return Err("cache.entries_per_size must be at least 1".to_string());
        }
        for (name, quality) in [
            ("images.final_quality", self.images.final_quality),
            ("images.normalized_quality", self.images.normalized_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(format!("{name} must be between 1 and 100, got {quality}"));
            }
        }
        if self.images.normalized_max_edge == 0 {
            return Err("images.normalized_max_edge must be positive".to_string());
        }
        if !self.images.normalize_blur_sigma.is_finite() || self.images.normalize_blur_sigma < 0.0 {
            return Err("images.normalize_blur_sigma must be zero or positive".to_string());
        }
        if self.rotation.refresh_interval.is_zero() {
            return Err("rotation.refresh_interval must be non-zero".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.precache.pacing, Duration::from_secs(5));
        assert_eq!(config.rotation.refresh_interval, Duration::from_secs(3600));
        assert_eq!(config.cache.capacity_for(5), 300);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.precache.workers = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.images.final_quality = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.images.normalized_quality = 101;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.images.normalize_blur_sigma = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let toml_source = r#"
            [web]
            port = 9000

            [rotation]
            refresh_interval = "15m"

            [rotation.discovery]
            provider = "static"
            urls = ["https://example.com/a.jpg"]
        "#;

        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::string(toml_source))
            .extract()
            .unwrap();

        assert_eq!(config.web.port, 9000);
        assert_eq!(config.web.host, DEFAULT_HOST);
        assert_eq!(config.rotation.refresh_interval, Duration::from_secs(900));
        assert_eq!(
            config.rotation.discovery,
            DiscoveryConfig::Static {
                urls: vec!["https://example.com/a.jpg".to_string()]
            }
        );
        assert_eq!(config.precache.workers, DEFAULT_PRECACHE_WORKERS);
    }
}
