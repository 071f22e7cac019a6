//! Content sources: where a widget gets its chapter text from.
//!
//! Widgets only see the [`ContentSource`] capability, so they can be driven
//! by a parsed page, by text that was extracted elsewhere, or by a synthetic
//! source in tests.

use crate::extract::{ChapterContent, ExtractConfig, extract_content};
use crate::parse::Document;
use crate::Result;

/// Something that can produce the primary text of the current page.
pub trait ContentSource {
    /// Extract the page's primary text.
    ///
    /// Empty text means no content region was found.
    fn extract_primary_text(&self) -> Result<ChapterContent>;

    /// The URL path of the page, when known
    fn page_path(&self) -> Option<&str> {
        None
    }
}

/// A rendered HTML page.
pub struct HtmlSource {
    document: Document,
    config: ExtractConfig,
}

impl HtmlSource {
    pub fn new(document: Document, config: ExtractConfig) -> Self {
        Self { document, config }
    }

    /// Parse `html` as a full page.
    pub fn parse(html: &str, config: ExtractConfig) -> Result<Self> {
        Ok(Self::new(Document::parse(html)?, config))
    }

    /// Parse `html` as the page served at `url`.
    pub fn parse_with_url(html: &str, url: &str, config: ExtractConfig) -> Result<Self> {
        Ok(Self::new(Document::parse_with_url(html, url)?, config))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl ContentSource for HtmlSource {
    fn extract_primary_text(&self) -> Result<ChapterContent> {
        extract_content(&self.document, &self.config).map(|extracted| extracted.content)
    }

    fn page_path(&self) -> Option<&str> {
        self.document.path()
    }
}

/// Text that is already plain, such as a reader's selection.
#[derive(Debug, Clone)]
pub struct TextSource {
    text: String,
    path: Option<String>,
}

impl TextSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), path: None }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl ContentSource for TextSource {
    fn extract_primary_text(&self) -> Result<ChapterContent> {
        Ok(ChapterContent::new(self.text.trim().to_string()))
    }

    fn page_path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}
