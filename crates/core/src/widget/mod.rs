//! Widget state machines.
//!
//! Every reader-assist widget follows the same lifecycle, implemented once by
//! [`Widget`]:
//!
//! ```text
//! Idle ──trigger──▶ Loading ──resolve──▶ Success(T) ──reset──▶ Idle
//!                     │    └──resolve──▶ Error(msg) ──trigger──▶ Loading
//!                     └──abandon──▶ Idle
//! ```
//!
//! A widget hands out at most one [`Flight`] at a time. While a flight is
//! outstanding, [`Widget::trigger`] returns `None`, which is how the
//! triggering control stays disabled and duplicate requests are never issued.

mod chat;
mod personalize;
mod translate;

#[cfg(test)]
pub(crate) mod stub;

pub use chat::{ChatMessage, ChatRole, ChatWidget, PendingChat, chapter_from_path};
pub use personalize::{PendingPersonalization, PersonalizeWidget};
pub use translate::{PendingTranslation, TranslateWidget};

use tracing::debug;

use crate::budget::{BudgetConfig, Budgeted, Confirm};
use crate::extract::ChapterContent;
use crate::source::ContentSource;
use crate::Result;

/// The observable state of a widget
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetState<T> {
    Idle,
    Loading,
    Success(T),
    Error(String),
}

/// Proof that a request is in flight; consumed when it completes
#[derive(Debug, PartialEq, Eq)]
pub struct Flight {
    id: u64,
}

/// Single-flight state machine parameterized by the success payload.
#[derive(Debug)]
pub struct Widget<T> {
    state: WidgetState<T>,
    in_flight: Option<u64>,
    flights: u64,
}

impl<T> Widget<T> {
    pub fn new() -> Self {
        Self { state: WidgetState::Idle, in_flight: None, flights: 0 }
    }

    pub fn state(&self) -> &WidgetState<T> {
        &self.state
    }

    /// Whether the triggering control should be disabled
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The held result, when in `Success`
    pub fn result(&self) -> Option<&T> {
        match &self.state {
            WidgetState::Success(value) => Some(value),
            _ => None,
        }
    }

    /// The error message, when in `Error`
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            WidgetState::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Enter `Loading` from any settled state.
    ///
    /// Returns `None` without any effect while a flight is outstanding.
    pub fn trigger(&mut self) -> Option<Flight> {
        if self.in_flight.is_some() {
            debug!("trigger ignored: request already in flight");
            return None;
        }

        self.flights += 1;
        self.in_flight = Some(self.flights);
        self.state = WidgetState::Loading;
        Some(Flight { id: self.flights })
    }

    /// Whether `flight` is the outstanding one
    pub fn owns(&self, flight: &Flight) -> bool {
        self.in_flight == Some(flight.id)
    }

    /// Settle the outstanding flight with its outcome.
    pub fn resolve(&mut self, flight: Flight, result: Result<T>) -> &WidgetState<T> {
        if self.in_flight != Some(flight.id) {
            debug!(flight = flight.id, "stale flight ignored");
            return &self.state;
        }

        self.in_flight = None;
        self.state = match result {
            Ok(value) => WidgetState::Success(value),
            Err(err) => {
                debug!(error = %err, "widget request failed");
                WidgetState::Error(err.user_message())
            }
        };
        &self.state
    }

    /// Give up the outstanding flight before anything was sent; back to `Idle`.
    pub fn abandon(&mut self, flight: Flight) {
        if self.in_flight == Some(flight.id) {
            self.in_flight = None;
            self.state = WidgetState::Idle;
        }
    }

    /// Discard a held result and return to `Idle`.
    ///
    /// Only `Success` is reset; other states are left as they are.
    pub fn reset(&mut self) -> Option<T> {
        if !matches!(self.state, WidgetState::Success(_)) {
            return None;
        }
        match std::mem::replace(&mut self.state, WidgetState::Idle) {
            WidgetState::Success(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> Default for Widget<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Trigger `widget`, then extract and budget the page text.
///
/// Returns the flight and payload when a request should be sent. Guard
/// failures settle the widget in `Error`; a declined truncation abandons the
/// flight so the widget is back in `Idle`.
pub(crate) fn prepare_payload<T>(
    widget: &mut Widget<T>, source: &dyn ContentSource, budget: &BudgetConfig, confirm: &mut dyn Confirm,
) -> Option<(Flight, ChapterContent)> {
    let flight = widget.trigger()?;

    match source.extract_primary_text().and_then(|content| budget.apply(content, confirm)) {
        Ok(Budgeted::Ready(content)) => Some((flight, content)),
        Ok(Budgeted::Declined) => {
            widget.abandon(flight);
            None
        }
        Err(err) => {
            widget.resolve(flight, Err(err));
            None
        }
    }
}
