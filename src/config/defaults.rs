/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

// HTTP client defaults
pub const DEFAULT_REQUEST_TIMEOUT: &str = "30s";
pub const DEFAULT_USER_AGENT: &str = concat!("backdrop-server/", env!("CARGO_PKG_VERSION"));

// Cache defaults
pub const DEFAULT_ENTRIES_PER_SIZE: usize = 50;
pub const DEFAULT_NORMALIZED_ENTRIES: usize = 50;

// Image defaults
pub const DEFAULT_FINAL_QUALITY: u8 = 75;
pub const DEFAULT_NORMALIZED_QUALITY: u8 = 95;
pub const DEFAULT_NORMALIZED_MAX_EDGE: u32 = 3840;
pub const DEFAULT_NORMALIZE_BLUR_SIGMA: f32 = 0.0;

// Rotation defaults
pub const DEFAULT_REFRESH_INTERVAL: &str = "1h";
pub const DEFAULT_WIKIMEDIA_SEARCH_URL: &str = "https://en.wikipedia.org/w/api.php?action=query&titles=Landscape&prop=images&imlimit=50&format=json";
pub const DEFAULT_WIKIMEDIA_FILE_ROOT_URL: &str = "https://commons.wikimedia.org/wiki/";

// Precache defaults
pub const DEFAULT_PRECACHE_WORKERS: usize = 2;
pub const DEFAULT_PRECACHE_PACING: &str = "5s";
