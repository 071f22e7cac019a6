//! Cleaning of a serialized content region before text rendering.
//!
//! The region is streamed through `lol_html` and every element matching the
//! denylist is dropped together with its subtree. The input is a copy of the
//! page's markup, so the parsed page itself is never touched.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::{FolioError, Result};

/// Structural and interactive chrome that never counts as chapter text.
///
/// Pagination, tables of contents, navigation landmarks, sidebars, buttons,
/// breadcrumbs, injected widget controls and page header/footer landmarks.
pub const DEFAULT_DENYLIST: &[&str] = &[
    ".pagination-nav",
    ".table-of-contents",
    ".theme-doc-toc-mobile",
    ".theme-doc-toc-desktop",
    "nav",
    "[role=\"navigation\"]",
    ".theme-doc-sidebar-container",
    "aside",
    "button",
    "[role=\"button\"]",
    ".breadcrumbs",
    ".theme-doc-breadcrumbs",
    "[data-folio-widget]",
    ".navbar",
    "[role=\"banner\"]",
    ".theme-doc-footer",
    "footer.footer",
    "[role=\"contentinfo\"]",
];

static HIDDEN_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(display\s*:\s*none|visibility\s*:\s*hidden)").unwrap());

/// Configuration for region cleaning
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// CSS selectors of elements to drop with their subtree
    pub denylist: Vec<String>,
    /// Whether to remove script, style, noscript and template tags
    pub remove_scripts: bool,
    /// Whether to remove elements that would not be rendered
    pub remove_hidden: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            denylist: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
            remove_scripts: true,
            remove_hidden: true,
        }
    }
}

/// Clean a serialized region according to `config`.
///
/// # Errors
///
/// Returns [`FolioError::HtmlParseError`] when a denylist selector is not a
/// selector `lol_html` can match, or when rewriting fails. A failed rewrite
/// never falls back to the uncleaned markup.
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> Result<String> {
    validate_selectors(&config.denylist)?;

    let mut processed = remove_denylisted(html, &config.denylist)?;

    if config.remove_scripts {
        processed = remove_denylisted(&processed, &["script", "style", "noscript", "template"])?;
    }

    if config.remove_hidden {
        processed = remove_hidden_elements(&processed)?;
    }

    Ok(processed)
}

/// Check that every selector parses for the streaming rewriter
pub fn validate_selectors<S: AsRef<str>>(selectors: &[S]) -> Result<()> {
    for selector in selectors {
        let selector = selector.as_ref();
        selector
            .parse::<lol_html::Selector>()
            .map_err(|e| FolioError::HtmlParseError(format!("Invalid denylist selector `{}`: {}", selector, e)))?;
    }
    Ok(())
}

/// Drop every element matching one of `selectors`, with its content
fn remove_denylisted<S: AsRef<str>>(html: &str, selectors: &[S]) -> Result<String> {
    if selectors.is_empty() {
        return Ok(html.to_string());
    }

    let handlers = selectors
        .iter()
        .map(|selector| {
            let selector: &str = selector.as_ref();
            lol_html::element!(selector, |el| {
                el.remove();
                Ok(())
            })
        })
        .collect();

    rewrite(html, handlers)
}

/// Remove elements the browser would not render
fn remove_hidden_elements(html: &str) -> Result<String> {
    rewrite(
        html,
        vec![lol_html::element!("*", |el| {
            let hidden_attr = el.has_attribute("hidden");
            let aria_hidden = el.get_attribute("aria-hidden").is_some_and(|v| v.eq_ignore_ascii_case("true"));
            let hidden_style = el.get_attribute("style").is_some_and(|s| HIDDEN_STYLE.is_match(&s));

            if hidden_attr || aria_hidden || hidden_style {
                el.remove();
            }
            Ok(())
        })],
    )
}

fn rewrite<'h, 's>(
    html: &str, element_content_handlers: Vec<(Cow<'s, lol_html::Selector>, lol_html::ElementContentHandlers<'h>)>,
) -> Result<String> {
    // Chunks may split a multi-byte character, so decode only once at the end.
    let mut output = Vec::with_capacity(html.len());
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings { element_content_handlers, ..Default::default() },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter
        .write(html.as_bytes())
        .map_err(|e| FolioError::HtmlParseError(e.to_string()))?;
    rewriter.end().map_err(|e| FolioError::HtmlParseError(e.to_string()))?;

    String::from_utf8(output).map_err(|e| FolioError::HtmlParseError(e.to_string()))
}
