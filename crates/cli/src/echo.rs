use owo_colors::OwoColorize;
use serde_json::Value;

use folio_core::{ChapterContent, TruncationNotice, User};

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "folio".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Reader-assist tools for documentation sites\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print the question asked before a truncated send
pub fn print_truncation_notice(notice: &TruncationNotice) {
    print_warning(&format!(
        "This page has {} characters; only the first {} will be sent.",
        notice.original_length, notice.budget
    ));
    eprintln!(
        "  {} ~{} tokens, ~${:.4}",
        "Estimated cost:".dimmed(),
        notice.estimated_tokens.to_string().bright_white(),
        notice.estimated_cost_usd
    );
}

/// Print extracted content details
pub fn print_content_details(content: &ChapterContent, selector: Option<&str>) {
    eprintln!("  {} {}", "Region:".dimmed(), selector.unwrap_or("none").bright_white());
    eprintln!("  {} {}", "Characters:".dimmed(), content.length.to_string().bright_white());
    if content.truncated {
        eprintln!("  {} {}", "Truncated:".dimmed(), "yes".bright_yellow());
    }
    eprintln!();
}

/// Print who is logged in
pub fn print_user(user: &User) {
    println!("{} <{}>", user.name.bold(), user.email);
}

/// Print token usage reported by the backend
pub fn print_usage(tokens: Option<u64>, cost_usd: Option<f64>) {
    if let Some(tokens) = tokens {
        eprintln!("  {} {}", "Tokens used:".dimmed(), tokens.to_string().bright_white());
    }
    if let Some(cost) = cost_usd {
        eprintln!("  {} ${:.6}", "Estimated cost:".dimmed(), cost);
    }
}

/// Print the book passages a chat answer was drawn from
pub fn print_sources(sources: &[Value]) {
    if sources.is_empty() {
        return;
    }
    eprintln!("  {}", "Sources:".dimmed());
    for source in sources {
        eprintln!("    {} {}", "-".dimmed(), source_label(source).bright_white());
    }
}

/// "module / chapter" for a retrieval source, or its raw JSON when unrecognized
fn source_label(source: &Value) -> String {
    match (str_field(source, "module"), str_field(source, "chapter")) {
        (Some(module), Some(chapter)) => format!("{} / {}", module, chapter),
        (None, Some(chapter)) => chapter.to_string(),
        _ => match source.as_str() {
            Some(text) => text.to_string(),
            None => source.to_string(),
        },
    }
}

fn str_field<'a>(source: &'a Value, name: &str) -> Option<&'a str> {
    source.get(name).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
