//! Translate the current chapter into the reader's language.

use crate::api::{TranslateRequest, Translation};
use crate::budget::{BudgetConfig, Confirm};
use crate::client::Backend;
use crate::source::ContentSource;
use crate::widget::{Flight, Widget, WidgetState, prepare_payload};
use crate::Result;

/// A translation request that passed every local guard
#[derive(Debug)]
pub struct PendingTranslation {
    flight: Flight,
    pub request: TranslateRequest,
    /// Whether the content was cut to the budget
    pub truncated: bool,
}

/// Translates the current chapter into one target language.
///
/// Reset ("show original") discards the translation and returns to `Idle`.
#[derive(Debug)]
pub struct TranslateWidget {
    widget: Widget<Translation>,
    target_language: String,
    budget: BudgetConfig,
}

impl TranslateWidget {
    pub fn new(target_language: impl Into<String>, budget: BudgetConfig) -> Self {
        Self { widget: Widget::new(), target_language: target_language.into(), budget }
    }

    pub fn state(&self) -> &WidgetState<Translation> {
        self.widget.state()
    }

    pub fn is_loading(&self) -> bool {
        self.widget.is_loading()
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// React to the translate button: extract, guard, and build the request.
    ///
    /// Returns `None` when nothing should be sent: a request is already in
    /// flight, the page had no usable content (the widget is now in `Error`),
    /// or truncation was declined (the widget is back in `Idle`).
    pub fn prepare(&mut self, source: &dyn ContentSource, confirm: &mut dyn Confirm) -> Option<PendingTranslation> {
        let (flight, content) = prepare_payload(&mut self.widget, source, &self.budget, confirm)?;

        Some(PendingTranslation {
            flight,
            request: TranslateRequest { content: content.text, target_language: self.target_language.clone() },
            truncated: content.truncated,
        })
    }

    /// Deliver the backend's answer for a pending request.
    pub fn complete(&mut self, pending: PendingTranslation, result: Result<Translation>) -> &WidgetState<Translation> {
        self.widget.resolve(pending.flight, result)
    }

    /// Prepare, send and complete in one step.
    pub async fn run<B>(
        &mut self, backend: &B, source: &dyn ContentSource, confirm: &mut dyn Confirm,
    ) -> &WidgetState<Translation>
    where
        B: Backend + ?Sized,
    {
        let Some(pending) = self.prepare(source, confirm) else {
            return self.widget.state();
        };
        let result = backend.translate(&pending.request).await;
        self.complete(pending, result)
    }

    /// Show the original text again.
    pub fn show_original(&mut self) -> Option<Translation> {
        self.widget.reset()
    }
}
