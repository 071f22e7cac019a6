//! Plain-text rendering of cleaned HTML.
//!
//! [`render_text`] approximates what a browser reports as the rendered text
//! of an element: block boxes start new lines, paragraphs and headings are
//! separated by a blank line, runs of inline whitespace collapse to a single
//! space, and `<pre>` keeps its whitespace verbatim. [`normalize_text`] then
//! applies the final newline collapsing and trimming.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Node};

static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Elements that occupy their own line
const BLOCK_ELEMENTS: &[&str] = &[
    "address",
    "article",
    "blockquote",
    "dd",
    "details",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "header",
    "hr",
    "li",
    "main",
    "ol",
    "section",
    "summary",
    "table",
    "tr",
    "ul",
];

/// Elements surrounded by a blank line
const SPACED_ELEMENTS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6", "pre"];

/// Elements that never produce rendered text
const NON_RENDERED: &[&str] = &["head", "script", "style", "noscript", "template", "title", "meta", "link"];

/// Render `element` the way a browser lays its text out.
pub fn render_text(element: ElementRef<'_>) -> String {
    let mut writer = TextWriter::default();
    writer.walk(element, false);
    writer.finish()
}

/// Raw text content: every descendant text node, concatenated.
pub fn raw_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Collapse three or more consecutive newlines to two and trim the result.
pub fn normalize_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    EXCESS_NEWLINES.replace_all(&text, "\n\n").trim().to_string()
}

#[derive(Default)]
struct TextWriter {
    out: String,
    pending_breaks: usize,
    pending_space: bool,
}

impl TextWriter {
    fn walk(&mut self, element: ElementRef<'_>, preformatted: bool) {
        let tag = element.value().name();

        if NON_RENDERED.contains(&tag) {
            return;
        }

        if tag == "br" {
            self.line_break();
            return;
        }

        let breaks = block_breaks(tag);
        self.require_breaks(breaks);

        if matches!(tag, "td" | "th") {
            self.pending_space = true;
        }

        let preformatted = preformatted || tag == "pre";

        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text, preformatted),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.walk(child, preformatted);
                    }
                }
                _ => {}
            }
        }

        self.require_breaks(breaks);
    }

    fn push_text(&mut self, text: &str, preformatted: bool) {
        if preformatted {
            if !text.is_empty() {
                self.flush();
                self.out.push_str(text);
            }
            return;
        }

        for c in text.chars() {
            if c.is_whitespace() {
                self.pending_space = true;
            } else {
                self.flush();
                self.out.push(c);
            }
        }
    }

    fn require_breaks(&mut self, count: usize) {
        if count > 0 && !self.out.is_empty() {
            self.pending_breaks = self.pending_breaks.max(count);
            self.pending_space = false;
        }
    }

    fn line_break(&mut self) {
        self.flush();
        self.out.push('\n');
        self.pending_space = false;
    }

    /// Emit whatever separator is owed before the next visible character
    fn flush(&mut self) {
        if self.pending_breaks > 0 {
            let owed = self.pending_breaks.saturating_sub(trailing_newlines(&self.out));
            for _ in 0..owed {
                self.out.push('\n');
            }
        } else if self.pending_space && !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push(' ');
        }
        self.pending_breaks = 0;
        self.pending_space = false;
    }

    fn finish(self) -> String {
        self.out
    }
}

fn block_breaks(tag: &str) -> usize {
    if SPACED_ELEMENTS.contains(&tag) {
        2
    } else if BLOCK_ELEMENTS.contains(&tag) {
        1
    } else {
        0
    }
}

fn trailing_newlines(s: &str) -> usize {
    s.chars().rev().take_while(|c| *c == '\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use scraper::Html;

    fn render(html: &str) -> String {
        let fragment = Html::parse_fragment(html);
        render_text(fragment.root_element())
    }

    #[test]
    fn test_paragraphs_are_separated_by_blank_line() {
        let text = render("<div><h1>Title</h1><p>First paragraph.</p><p>Second paragraph.</p></div>");
        assert_eq!(text, "Title\n\nFirst paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn test_inline_whitespace_collapses() {
        let text = render("<p>  Robots   <em>move</em>\n\t in <strong>space</strong>.  </p>");
        assert_eq!(text, "Robots move in space.");
    }

    #[test]
    fn test_list_items_on_own_lines() {
        let text = render("<ul><li>ROS 2</li><li>Gazebo</li><li>Isaac Sim</li></ul>");
        assert_eq!(text, "ROS 2\nGazebo\nIsaac Sim");
    }

    #[test]
    fn test_br_breaks_line() {
        let text = render("<p>line one<br>line two</p>");
        assert_eq!(text, "line one\nline two");
    }

    #[test]
    fn test_pre_keeps_whitespace() {
        let text = render("<p>Run:</p><pre>ros2 run  demo_nodes_cpp talker\n  --ros-args</pre>");
        assert_eq!(text, "Run:\n\nros2 run  demo_nodes_cpp talker\n  --ros-args");
    }

    #[test]
    fn test_script_text_is_not_rendered() {
        let text = render("<div><script>var hidden = 1;</script><p>Shown</p></div>");
        assert_eq!(text, "Shown");
    }

    #[test]
    fn test_table_cells_are_spaced() {
        let text = render("<table><tr><th>Part</th><th>Cost</th></tr><tr><td>Jetson</td><td>$249</td></tr></table>");
        assert_eq!(text, "Part Cost\nJetson $249");
    }

    #[rstest]
    #[case("a\n\n\nb", "a\n\nb")]
    #[case("a\n\n\n\n\n\nb", "a\n\nb")]
    #[case("a\n\nb", "a\n\nb")]
    #[case("\n\n  padded  \n", "padded")]
    #[case("x\r\n\r\n\r\ny", "x\n\ny")]
    #[case("", "")]
    fn test_normalize_text(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_text(input), expected);
    }

    #[test]
    fn test_raw_text_concatenates_nodes() {
        let fragment = Html::parse_fragment("<div><p>One</p><p>Two</p></div>");
        assert_eq!(raw_text(fragment.root_element()), "OneTwo");
    }
}
