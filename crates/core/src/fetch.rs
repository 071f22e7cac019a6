//! Page loading from URLs, files, and stdin.
//!
//! These give the CLI a rendered chapter page to extract from: a published
//! docs site, a saved HTML file, or HTML piped in.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::{FolioError, Result};

/// HTTP settings for loading pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: concat!("Mozilla/5.0 (compatible; folio/", env!("CARGO_PKG_VERSION"), ")").to_string(),
        }
    }
}

/// Fetches a page over HTTP(S) and returns its body.
///
/// Redirects are followed and the configured timeout applies.
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    let parsed_url = Url::parse(url).map_err(|e| FolioError::InvalidUrl(e.to_string()))?;

    if !matches!(parsed_url.scheme(), "http" | "https") {
        return Err(FolioError::InvalidUrl(format!("URL must be http:// or https://, got {url}")));
    }

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(FolioError::HttpError)?;

    debug!(%parsed_url, "fetching page");
    let response = client
        .get(parsed_url)
        .header("User-Agent", &config.user_agent)
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() { FolioError::Timeout { timeout: config.timeout } } else { FolioError::HttpError(e) }
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FolioError::Status {
            status: status.as_u16(),
            detail: status.canonical_reason().unwrap_or("request failed").to_string(),
        });
    }

    Ok(response.text().await?)
}

/// Reads a saved page from disk.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(FolioError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(FolioError::from)
    }
}

/// Reads a page from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 30);
        assert!(config.user_agent.contains("folio"));
    }

    #[tokio::test]
    async fn test_fetch_url_invalid() {
        let result = fetch_url("not-a-url", &FetchConfig::default()).await;
        assert!(matches!(result, Err(FolioError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_url_rejects_file_scheme() {
        let result = fetch_url("file:///etc/hosts", &FetchConfig::default()).await;
        assert!(matches!(result, Err(FolioError::InvalidUrl(_))));
    }

    #[test]
    fn test_fetch_file_not_found() {
        let result = fetch_file("/nonexistent/path/file.html");
        assert!(matches!(result, Err(FolioError::FileNotFound(_))));
    }

    #[test]
    fn test_fetch_file_reads_page() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "<article>Hello</article>").unwrap();

        let html = fetch_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(html, "<article>Hello</article>");
    }
}
