//! Primary chapter text extraction.
//!
//! The content region is the first match among
//! [`ExtractConfig::content_selectors`]. A copy of it is cleaned with the
//! denylist and rendered to plain text; the page itself is never modified.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use crate::parse::{Document, Element};
use crate::preprocess::{DEFAULT_DENYLIST, PreprocessConfig, preprocess_html, validate_selectors};
use crate::text::{normalize_text, raw_text, render_text};
use crate::Result;

/// Content region selectors, tried in order: markdown body, doc item
/// container, then any article.
pub const DEFAULT_CONTENT_SELECTORS: &[&str] = &[".theme-doc-markdown", r#"[class*="docItemContainer"]"#, "article"];

/// Configuration for content extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Region selectors in priority order; the first one with a match wins
    pub content_selectors: Vec<String>,
    /// Elements dropped from the region before rendering
    pub denylist: Vec<String>,
    /// Use layout-aware rendered text, falling back to raw text when empty
    pub prefer_rendered_text: bool,
    /// Drop hidden elements (`hidden`, `aria-hidden`, `display:none`)
    pub remove_hidden: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            content_selectors: DEFAULT_CONTENT_SELECTORS.iter().map(|s| s.to_string()).collect(),
            denylist: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
            prefer_rendered_text: true,
            remove_hidden: true,
        }
    }
}

/// Plain text of a chapter, as extracted or as prepared for sending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterContent {
    /// The text itself
    pub text: String,
    /// Character count of the text as extracted, before any truncation
    pub length: usize,
    /// Whether `text` is a truncated prefix of the extracted text
    pub truncated: bool,
    /// When the text was extracted
    #[serde(with = "time::serde::rfc3339")]
    pub extracted_at: OffsetDateTime,
}

impl ChapterContent {
    /// Wrap freshly extracted text
    pub fn new(text: String) -> Self {
        let length = text.chars().count();
        Self { text, length, truncated: false, extracted_at: OffsetDateTime::now_utc() }
    }

    /// Whether there is no text at all
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// The result of content extraction
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    /// The normalized chapter text (empty when no region matched)
    pub content: ChapterContent,
    /// The selector that located the region
    pub selector: Option<String>,
}

/// Find the content region: the first element matching the first selector
/// that matches anything
fn locate_region<'a>(doc: &'a Document, selectors: &[String]) -> Result<Option<(String, Element<'a>)>> {
    for selector in selectors {
        if let Some(element) = doc.select_first(selector)? {
            return Ok(Some((selector.clone(), element)));
        }
    }
    Ok(None)
}

/// Extract the primary text of a page.
///
/// The matched region is serialized and cleaned as a copy, rendered to text,
/// then normalized. When no selector matches, the returned content is empty;
/// callers decide that this means "no content found".
///
/// # Errors
///
/// Returns [`crate::FolioError::HtmlParseError`] for invalid selectors.
pub fn extract_content(doc: &Document, config: &ExtractConfig) -> Result<ExtractedContent> {
    validate_selectors(&config.denylist)?;

    let Some((selector, region)) = locate_region(doc, &config.content_selectors)? else {
        debug!("no content region matched {:?}", config.content_selectors);
        return Ok(ExtractedContent { content: ChapterContent::new(String::new()), selector: None });
    };

    let preprocess = PreprocessConfig {
        denylist: config.denylist.clone(),
        remove_scripts: true,
        remove_hidden: config.remove_hidden,
    };
    let cleaned = preprocess_html(&region.outer_html(), &preprocess)?;
    let fragment = Document::parse_fragment(&cleaned);
    let root = fragment.root().element_ref();

    let rendered = if config.prefer_rendered_text { render_text(root) } else { String::new() };
    let text = if rendered.trim().is_empty() { raw_text(root) } else { rendered };
    let text = normalize_text(&text);

    debug!(selector = %selector, chars = text.chars().count(), "extracted content region");

    Ok(ExtractedContent { content: ChapterContent::new(text), selector: Some(selector) })
}

/// Extract with the default configuration.
pub fn extract_primary_text(doc: &Document) -> Result<ChapterContent> {
    extract_content(doc, &ExtractConfig::default()).map(|extracted| extracted.content)
}
