//! URL utilities for consistent URL handling
//!
//! Source URLs come from scraped pages and end up in logs, so they are
//! resolved to absolute form on the way in and scrubbed of credentials on
//! the way out.

use url::Url;

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// Resolve a link found on `base` into an absolute http(s) URL
    ///
    /// Handles the protocol-relative (`//host/path`) and root-relative
    /// (`/path`) forms that scraped pages commonly use.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use backdrop_server::utils::url::UrlUtils;
    ///
    /// assert_eq!(
    ///     UrlUtils::absolutize("https://commons.wikimedia.org/wiki/File:A.jpg", "//upload.wikimedia.org/a.jpg").as_deref(),
    ///     Some("https://upload.wikimedia.org/a.jpg")
    /// );
    /// ```
    pub fn absolutize(base: &str, link: &str) -> Option<String> {
        let link = link.trim();
        let resolved = match Url::parse(link) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base).ok()?.join(link).ok()?,
            Err(_) => return None,
        };

        matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
    }

    /// Lowercased extension of the URL's last path segment, if any
    pub fn extension(url_or_path: &str) -> Option<String> {
        let path = match Url::parse(url_or_path) {
            Ok(url) => url.path().to_string(),
            Err(_) => url_or_path
                .split(['?', '#'])
                .next()
                .unwrap_or(url_or_path)
                .to_string(),
        };

        let file_name = path.rsplit('/').next()?;
        let (stem, extension) = file_name.rsplit_once('.')?;
        if stem.is_empty() || extension.is_empty() {
            return None;
        }
        Some(extension.to_ascii_lowercase())
    }

    /// Check that a URL parses and uses http or https
    pub fn is_valid(url: &str) -> bool {
        Url::parse(url)
            .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
            .unwrap_or(false)
    }

    /// Replace credentials in a URL with asterisks for logging
    pub fn obfuscate_credentials(url: &str) -> String {
        use regex::Regex;

        let mut obfuscated = url.to_string();

        if let Ok(parsed) = Url::parse(url)
            && (!parsed.username().is_empty() || parsed.password().is_some())
        {
            let mut new_url = parsed.clone();
            let _ = new_url.set_username("****");
            let _ = new_url.set_password(Some("****"));
            obfuscated = new_url.to_string();
        }

        let sensitive_params = ["username", "password", "user", "pass", "pwd", "passwd", "token", "key"];

        for param in &sensitive_params {
            let pattern = format!(r"(?i)([?&]{}=)[^&]*", regex::escape(param));
            if let Ok(re) = Regex::new(&pattern) {
                obfuscated = re.replace_all(&obfuscated, "${1}****").to_string();
            }
        }

        obfuscated
    }
}
