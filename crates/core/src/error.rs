//! Error types for Folio operations.
//!
//! This module defines the main error type [`FolioError`] which represents
//! every failure a widget invocation can run into: extraction, payload
//! guards, backend calls, session and configuration handling.
//!
//! # Example
//!
//! ```rust
//! use folio_core::{FolioError, Result};
//!
//! fn require_text(text: &str) -> Result<&str> {
//!     if text.is_empty() {
//!         return Err(FolioError::NoContent);
//!     }
//!     Ok(text)
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for extraction and widget operations.
///
/// Every variant is terminal for the invocation that produced it. Widgets
/// store [`FolioError::user_message`] in their `Error` state and wait for the
/// next user action; nothing is retried automatically.
#[derive(Error, Debug)]
pub enum FolioError {
    /// Transport errors from reqwest.
    ///
    /// Connection refused, DNS failures, TLS problems and body decoding
    /// failures all land here.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    ///
    /// `detail` carries the best available explanation: the `detail` field of
    /// a JSON error body when present, otherwise the canonical status reason.
    #[error("Backend returned {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The response body was not the JSON the endpoint promises.
    #[error("Failed to decode response: {0}")]
    DecodeError(#[from] serde_json::Error),

    /// The backend answered successfully but the expected field was absent.
    #[error("Malformed response: missing field `{field}`")]
    MalformedResponse { field: &'static str },

    /// Request timeout.
    ///
    /// Only returned when a timeout was explicitly configured.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML parsing or selector errors.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// No content region was found on the page, or it held no text.
    #[error("No chapter content found on this page")]
    NoContent,

    /// The extracted text is shorter than the minimum viable length.
    #[error("Content too short to process ({length} characters, need at least {minimum})")]
    ContentTooShort { length: usize, minimum: usize },

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O errors while reading pages, config or session files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Session store errors.
    #[error("Session error: {0}")]
    SessionError(String),
}

impl FolioError {
    /// The message a widget shows to the reader for this failure.
    ///
    /// Transport and malformed-response failures collapse into one generic
    /// sentence with the detail appended; content failures read as guidance.
    pub fn user_message(&self) -> String {
        match self {
            FolioError::NoContent => "No content found on this page.".to_string(),
            FolioError::ContentTooShort { .. } => "Not enough content on this page to process.".to_string(),
            FolioError::Status { detail, .. } => format!("Request failed. Please try again. ({detail})"),
            FolioError::MalformedResponse { field } => {
                format!("Request failed. Please try again. (response had no `{field}`)")
            }
            FolioError::HttpError(e) => format!("Request failed. Please try again. ({e})"),
            FolioError::DecodeError(e) => format!("Request failed. Please try again. ({e})"),
            FolioError::Timeout { timeout } => {
                format!("Request failed. Please try again. (no answer after {timeout}s)")
            }
            other => other.to_string(),
        }
    }
}

/// Result type alias for FolioError.
pub type Result<T> = std::result::Result<T, FolioError>;
