//! Layered configuration.
//!
//! Defaults, then a TOML file, then environment overrides. Every section is
//! optional in the file; missing keys keep their defaults.
//!
//! ```toml
//! target_language = "ur"
//!
//! [api]
//! base_url = "https://book.example.com"
//! timeout = 60
//!
//! [budget]
//! max_chars = 3000
//!
//! [extract]
//! content_selectors = [".theme-doc-markdown", "article"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::budget::BudgetConfig;
use crate::client::ApiConfig;
use crate::extract::ExtractConfig;
use crate::fetch::FetchConfig;
use crate::{FolioError, Result};

/// Environment variable that overrides `api.base_url`
pub const API_URL_ENV: &str = "FOLIO_API_URL";

/// Everything configurable about folio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    pub api: ApiConfig,
    pub budget: BudgetConfig,
    pub extract: ExtractConfig,
    pub fetch: FetchConfig,
    /// Language code for translation (default: "ur")
    pub target_language: String,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            budget: BudgetConfig::default(),
            extract: ExtractConfig::default(),
            fetch: FetchConfig::default(),
            target_language: "ur".to_string(),
        }
    }
}

impl FolioConfig {
    pub fn builder() -> FolioConfigBuilder {
        FolioConfigBuilder::new()
    }

    /// `<config dir>/folio/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("folio").join("config.toml"))
    }

    /// Parse a TOML document.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| FolioError::ConfigError(e.to_string()))
    }

    /// Read the file at `path`, which must exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FolioError::FileNotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        Self::from_toml(&raw).map_err(|e| match e {
            FolioError::ConfigError(msg) => FolioError::ConfigError(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Load configuration for a run.
    ///
    /// An explicit `path` must exist. Without one, the default path is used
    /// when present and defaults otherwise. Environment overrides apply last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(default) => Self::from_file(&default)?,
                None => Self::default(),
            },
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.apply_api_url(&url);
        }

        Ok(config)
    }

    fn apply_api_url(&mut self, url: &str) {
        let url = url.trim();
        if !url.is_empty() {
            debug!(url, "backend URL from environment");
            self.api.base_url = url.to_string();
        }
    }
}

/// Builder for [`FolioConfig`].
///
/// ```rust
/// use folio_core::FolioConfig;
///
/// let config = FolioConfig::builder()
///     .base_url("https://book.example.com")
///     .max_chars(2000)
///     .target_language("ar")
///     .build();
/// assert_eq!(config.budget.max_chars, 2000);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FolioConfigBuilder {
    config: FolioConfig,
}

impl FolioConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(mut self, value: impl Into<String>) -> Self {
        self.config.api.base_url = value.into();
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.config.api.timeout = Some(seconds);
        self
    }

    pub fn max_chars(mut self, value: usize) -> Self {
        self.config.budget.max_chars = value;
        self
    }

    pub fn min_chars(mut self, value: usize) -> Self {
        self.config.budget.min_chars = value;
        self
    }

    pub fn content_selectors<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.extract.content_selectors = selectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn deny(mut self, selector: impl Into<String>) -> Self {
        self.config.extract.denylist.push(selector.into());
        self
    }

    pub fn target_language(mut self, value: impl Into<String>) -> Self {
        self.config.target_language = value.into();
        self
    }

    pub fn build(self) -> FolioConfig {
        self.config
    }
}
