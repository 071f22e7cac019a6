//! Cost guard for outgoing payloads.
//!
//! Every payload passes through [`BudgetConfig::apply`] before it reaches the
//! backend. Text below the minimum viable length is rejected outright; text
//! above the character budget is cut to a prefix, but only after the
//! [`Confirm`] capability agrees.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::extract::ChapterContent;
use crate::{FolioError, Result};

/// Character budget and cost-estimate settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Maximum characters sent in one request (default: 3000)
    pub max_chars: usize,
    /// Shortest text worth sending (default: 10)
    pub min_chars: usize,
    /// Estimated price per 1000 tokens in USD (default: 0.002)
    pub cost_per_1k_tokens_usd: f64,
    /// Characters per token used for estimates (default: 4)
    pub chars_per_token: usize,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self { max_chars: 3000, min_chars: 10, cost_per_1k_tokens_usd: 0.002, chars_per_token: 4 }
    }
}

/// What the user is asked to agree to before a truncated send
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruncationNotice {
    /// Characters extracted from the page
    pub original_length: usize,
    /// Characters that will actually be sent
    pub budget: usize,
    /// Estimated tokens of the truncated payload
    pub estimated_tokens: usize,
    /// Estimated cost of the truncated payload
    pub estimated_cost_usd: f64,
}

/// Asks the user whether a truncated payload may be sent.
pub trait Confirm {
    fn confirm_truncation(&mut self, notice: &TruncationNotice) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&TruncationNotice) -> bool,
{
    fn confirm_truncation(&mut self, notice: &TruncationNotice) -> bool {
        self(notice)
    }
}

/// Confirms every truncation (non-interactive use).
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm_truncation(&mut self, _notice: &TruncationNotice) -> bool {
        true
    }
}

/// Declines every truncation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

impl Confirm for NeverConfirm {
    fn confirm_truncation(&mut self, _notice: &TruncationNotice) -> bool {
        false
    }
}

/// Outcome of applying the budget
#[derive(Debug, Clone, PartialEq)]
pub enum Budgeted {
    /// The payload to send, possibly a truncated prefix
    Ready(ChapterContent),
    /// The user declined truncation; nothing may be sent
    Declined,
}

impl BudgetConfig {
    /// Reject text that is missing or too short to be worth a request.
    pub fn check_minimum(&self, content: &ChapterContent) -> Result<()> {
        let length = content.text.chars().count();
        if length == 0 {
            return Err(FolioError::NoContent);
        }
        if length < self.min_chars {
            return Err(FolioError::ContentTooShort { length, minimum: self.min_chars });
        }
        Ok(())
    }

    /// Estimated tokens for `chars` characters, rounded up
    pub fn estimate_tokens(&self, chars: usize) -> usize {
        chars.div_ceil(self.chars_per_token.max(1))
    }

    /// Estimated cost in USD for `chars` characters
    pub fn estimate_cost_usd(&self, chars: usize) -> f64 {
        self.estimate_tokens(chars) as f64 / 1000.0 * self.cost_per_1k_tokens_usd
    }

    /// Guard and, if needed, truncate `content`.
    ///
    /// # Errors
    ///
    /// [`FolioError::NoContent`] for empty text and
    /// [`FolioError::ContentTooShort`] below `min_chars`; both are raised
    /// before the truncation path is considered.
    pub fn apply(&self, content: ChapterContent, confirm: &mut dyn Confirm) -> Result<Budgeted> {
        self.check_minimum(&content)?;

        let length = content.text.chars().count();
        if length <= self.max_chars {
            debug!(chars = length, cost_usd = self.estimate_cost_usd(length), "payload within budget");
            return Ok(Budgeted::Ready(content));
        }

        let notice = TruncationNotice {
            original_length: length,
            budget: self.max_chars,
            estimated_tokens: self.estimate_tokens(self.max_chars),
            estimated_cost_usd: self.estimate_cost_usd(self.max_chars),
        };

        if !confirm.confirm_truncation(&notice) {
            debug!(chars = length, budget = self.max_chars, "truncation declined");
            return Ok(Budgeted::Declined);
        }

        warn!(chars = length, budget = self.max_chars, "sending truncated content");
        let text = truncate_chars(&content.text, self.max_chars).to_string();

        Ok(Budgeted::Ready(ChapterContent { text, truncated: true, ..content }))
    }
}

/// The first `max` characters of `text`, never splitting a character
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
