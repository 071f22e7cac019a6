//! Rewrite the current chapter for a reader's skill level.

use crate::api::{PersonalizeRequest, Personalization, SkillLevel};
use crate::budget::{BudgetConfig, Confirm};
use crate::client::Backend;
use crate::source::ContentSource;
use crate::widget::{Flight, Widget, WidgetState, prepare_payload};
use crate::Result;

/// A personalization request that passed every local guard
#[derive(Debug)]
pub struct PendingPersonalization {
    flight: Flight,
    pub request: PersonalizeRequest,
    pub truncated: bool,
}

/// Rewrites the current chapter for a chosen skill level.
#[derive(Debug)]
pub struct PersonalizeWidget {
    widget: Widget<Personalization>,
    chapter: String,
    level: Option<SkillLevel>,
    budget: BudgetConfig,
}

impl PersonalizeWidget {
    pub fn new(chapter: impl Into<String>, budget: BudgetConfig) -> Self {
        Self { widget: Widget::new(), chapter: chapter.into(), level: None, budget }
    }

    pub fn state(&self) -> &WidgetState<Personalization> {
        self.widget.state()
    }

    pub fn is_loading(&self) -> bool {
        self.widget.is_loading()
    }

    /// The level picked most recently, kept until reset
    pub fn level(&self) -> Option<SkillLevel> {
        self.level
    }

    pub fn chapter(&self) -> &str {
        &self.chapter
    }

    /// React to a level being picked from the dropdown.
    pub fn prepare(
        &mut self, level: SkillLevel, source: &dyn ContentSource, confirm: &mut dyn Confirm,
    ) -> Option<PendingPersonalization> {
        if self.widget.is_loading() {
            return None;
        }

        let (flight, content) = prepare_payload(&mut self.widget, source, &self.budget, confirm)?;
        self.level = Some(level);

        Some(PendingPersonalization {
            flight,
            request: PersonalizeRequest { content: content.text, chapter: self.chapter.clone(), user_level: level },
            truncated: content.truncated,
        })
    }

    pub fn complete(
        &mut self, pending: PendingPersonalization, result: Result<Personalization>,
    ) -> &WidgetState<Personalization> {
        self.widget.resolve(pending.flight, result)
    }

    /// Prepare, send and complete in one step.
    pub async fn run<B>(
        &mut self, backend: &B, level: SkillLevel, source: &dyn ContentSource, confirm: &mut dyn Confirm,
    ) -> &WidgetState<Personalization>
    where
        B: Backend + ?Sized,
    {
        let Some(pending) = self.prepare(level, source, confirm) else {
            return self.widget.state();
        };
        let result = backend.personalize(&pending.request).await;
        self.complete(pending, result)
    }

    /// Back to the original text; forgets the chosen level.
    pub fn reset(&mut self) -> Option<Personalization> {
        let previous = self.widget.reset();
        if previous.is_some() {
            self.level = None;
        }
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::NeverConfirm;
    use crate::source::TextSource;
    use crate::widget::stub::StubBackend;

    const TEXT: &str = "Forward kinematics maps joint angles to an end-effector pose.";

    #[tokio::test]
    async fn test_request_carries_chapter_and_level() {
        let backend = StubBackend::default();
        let mut personalize = PersonalizeWidget::new("module-3/kinematics", BudgetConfig::default());

        let state = personalize.run(&backend, SkillLevel::Beginner, &TextSource::new(TEXT), &mut NeverConfirm).await;
        assert!(matches!(state, WidgetState::Success(p) if p.level == SkillLevel::Beginner));

        let requests = backend.requests();
        assert_eq!(requests[0].1["chapter"], "module-3/kinematics");
        assert_eq!(requests[0].1["user_level"], "beginner");
        assert_eq!(personalize.level(), Some(SkillLevel::Beginner));
    }

    #[tokio::test]
    async fn test_reset_forgets_level() {
        let backend = StubBackend::default();
        let mut personalize = PersonalizeWidget::new("intro", BudgetConfig::default());
        personalize.run(&backend, SkillLevel::Advanced, &TextSource::new(TEXT), &mut NeverConfirm).await;

        assert!(personalize.reset().is_some());
        assert_eq!(personalize.level(), None);
        assert_eq!(personalize.state(), &WidgetState::Idle);
    }

    #[tokio::test]
    async fn test_failure_keeps_widget_in_error() {
        let backend = StubBackend::failing(502);
        let mut personalize = PersonalizeWidget::new("intro", BudgetConfig::default());

        let state = personalize.run(&backend, SkillLevel::Intermediate, &TextSource::new(TEXT), &mut NeverConfirm).await;
        assert!(matches!(state, WidgetState::Error(_)));
        assert!(personalize.reset().is_none());
    }

    #[test]
    fn test_pending_blocks_new_level() {
        let mut personalize = PersonalizeWidget::new("intro", BudgetConfig::default());
        let source = TextSource::new(TEXT);

        assert!(personalize.prepare(SkillLevel::Beginner, &source, &mut NeverConfirm).is_some());
        assert!(personalize.prepare(SkillLevel::Advanced, &source, &mut NeverConfirm).is_none());
        assert_eq!(personalize.level(), Some(SkillLevel::Beginner));
    }
}
