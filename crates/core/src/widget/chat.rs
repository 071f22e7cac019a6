//! Chapter-aware chat assistant.
//!
//! [`ChatWidget`] keeps the ordered conversation log, an optional text
//! selection sent as context, and the backend's conversation id across turns.
//! A failed turn still appends an assistant message so every question has an
//! answer in the log.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use crate::api::{ChatQuery, ChatReply};
use crate::client::Backend;
use crate::widget::{Flight, Widget, WidgetState};
use crate::{FolioError, Result};

static CHAPTER_PATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"docs/(.*)").expect("valid chapter regex"));

/// Selections this short or shorter are treated as accidental clicks.
const MIN_SELECTION_CHARS: usize = 10;

const APOLOGY_ERROR: &str = "Sorry, I encountered an error. Please try again.";
const APOLOGY_UNAVAILABLE: &str = "Sorry, I am currently unavailable. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One entry of the chat log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into(), timestamp: OffsetDateTime::now_utc() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into(), timestamp: OffsetDateTime::now_utc() }
    }
}

/// The chapter slug of a docs page path, or `"unknown"`.
///
/// ```
/// use folio_core::widget::chapter_from_path;
///
/// assert_eq!(chapter_from_path("/docs/module-1/ros2-basics"), "module-1/ros2-basics");
/// assert_eq!(chapter_from_path("/blog/launch"), "unknown");
/// ```
pub fn chapter_from_path(path: &str) -> String {
    CHAPTER_PATH
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches('/'))
        .filter(|chapter| !chapter.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// A chat query that has been logged and is waiting for its answer
#[derive(Debug)]
pub struct PendingChat {
    flight: Flight,
    pub query: ChatQuery,
}

/// Conversational widget: an append-only message log plus the
/// request lifecycle of the current question.
#[derive(Debug)]
pub struct ChatWidget {
    widget: Widget<ChatReply>,
    chapter: String,
    messages: Vec<ChatMessage>,
    selection: Option<String>,
    conversation_id: Option<String>,
}

impl ChatWidget {
    pub fn new(chapter: impl Into<String>) -> Self {
        Self {
            widget: Widget::new(),
            chapter: chapter.into(),
            messages: Vec::new(),
            selection: None,
            conversation_id: None,
        }
    }

    /// A widget for the page served at `path`
    pub fn for_path(path: &str) -> Self {
        Self::new(chapter_from_path(path))
    }

    pub fn state(&self) -> &WidgetState<ChatReply> {
        self.widget.state()
    }

    pub fn is_loading(&self) -> bool {
        self.widget.is_loading()
    }

    pub fn chapter(&self) -> &str {
        &self.chapter
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The captured selection that will accompany the next query
    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// Record text the reader selected on the page.
    ///
    /// Returns whether the selection was long enough to be kept. A short
    /// selection leaves any earlier one in place.
    pub fn select_text(&mut self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.chars().count() <= MIN_SELECTION_CHARS {
            return false;
        }
        debug!(chars = trimmed.chars().count(), "selection captured");
        self.selection = Some(trimmed.to_string());
        true
    }

    /// Log the reader's question and build the request for it.
    ///
    /// Blank input and input sent while an answer is pending are ignored.
    pub fn prepare_query(&mut self, input: &str) -> Option<PendingChat> {
        let text = input.trim();
        if text.is_empty() || self.widget.is_loading() {
            return None;
        }

        let flight = self.widget.trigger()?;
        self.messages.push(ChatMessage::user(text));

        Some(PendingChat {
            flight,
            query: ChatQuery {
                query: text.to_string(),
                context: self.selection.clone(),
                chapter: self.chapter.clone(),
                conversation_id: self.conversation_id.clone(),
            },
        })
    }

    /// Deliver the backend's answer, appending it (or an apology) to the log.
    pub fn complete(&mut self, pending: PendingChat, result: Result<ChatReply>) -> &WidgetState<ChatReply> {
        let message = match &result {
            Ok(reply) => reply.response.clone(),
            Err(err) => apology(err).to_string(),
        };

        if !self.widget.owns(&pending.flight) {
            return self.widget.state();
        }

        self.widget.resolve(pending.flight, result);
        if let Some(reply) = self.widget.result() {
            if reply.conversation_id.is_some() {
                self.conversation_id = reply.conversation_id.clone();
            }
            self.selection = None;
        }
        self.messages.push(ChatMessage::assistant(message));
        self.widget.state()
    }

    /// Prepare, send and complete in one step.
    pub async fn send<B>(&mut self, backend: &B, input: &str) -> &WidgetState<ChatReply>
    where
        B: Backend + ?Sized,
    {
        let Some(pending) = self.prepare_query(input) else {
            return self.widget.state();
        };
        let result = backend.chat(&pending.query).await;
        self.complete(pending, result)
    }

    /// Start over: clear the log, the selection and the conversation.
    pub fn new_chat(&mut self) {
        self.messages.clear();
        self.selection = None;
        self.conversation_id = None;
        if !self.widget.is_loading() {
            self.widget = Widget::new();
        }
    }
}

/// The assistant's reply when a query fails
fn apology(err: &FolioError) -> &'static str {
    match err {
        FolioError::HttpError(_) | FolioError::Timeout { .. } | FolioError::DecodeError(_) => APOLOGY_UNAVAILABLE,
        _ => APOLOGY_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::stub::StubBackend;
    use rstest::rstest;

    #[rstest]
    #[case("/docs/module-1/ros2-basics", "module-1/ros2-basics")]
    #[case("/docs/intro/", "intro")]
    #[case("/docs/", "unknown")]
    #[case("/", "unknown")]
    fn test_chapter_from_path(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(chapter_from_path(path), expected);
    }

    #[test]
    fn test_short_selection_is_ignored() {
        let mut chat = ChatWidget::new("intro");
        assert!(!chat.select_text("   ten chars!  "));
        assert!(chat.selection().is_none());

        assert!(chat.select_text("  inverse kinematics  "));
        assert_eq!(chat.selection(), Some("inverse kinematics"));
    }

    #[test]
    fn test_blank_query_is_ignored() {
        let mut chat = ChatWidget::new("intro");
        assert!(chat.prepare_query("   ").is_none());
        assert!(chat.messages().is_empty());
        assert_eq!(chat.state(), &WidgetState::Idle);
    }

    #[test]
    fn test_query_while_pending_is_ignored() {
        let mut chat = ChatWidget::new("intro");
        let pending = chat.prepare_query("What is a URDF?");
        assert!(pending.is_some());
        assert!(chat.prepare_query("Hello?").is_none());
        assert_eq!(chat.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_send_carries_selection_and_chapter() {
        let backend = StubBackend::default();
        let mut chat = ChatWidget::for_path("/docs/module-2/slam");
        chat.select_text("Simultaneous localization and mapping");

        chat.send(&backend, "Explain this").await;

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "/api/chat/query");
        assert_eq!(requests[0].1["chapter"], "module-2/slam");
        assert_eq!(requests[0].1["context"], "Simultaneous localization and mapping");

        let roles: Vec<_> = chat.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Assistant]);
        assert!(chat.selection().is_none());
        assert_eq!(chat.conversation_id(), Some("conv-1"));
    }

    #[tokio::test]
    async fn test_conversation_id_is_sent_on_follow_up() {
        let backend = StubBackend::default();
        let mut chat = ChatWidget::new("intro");

        chat.send(&backend, "First").await;
        chat.send(&backend, "Second").await;

        let requests = backend.requests();
        assert!(requests[0].1.get("conversation_id").is_none());
        assert_eq!(requests[1].1["conversation_id"], "conv-1");
        assert_eq!(chat.messages().len(), 4);
    }

    #[tokio::test]
    async fn test_failure_appends_apology() {
        let backend = StubBackend::failing(500);
        let mut chat = ChatWidget::new("intro");
        chat.select_text("a selection worth keeping");

        let state = chat.send(&backend, "Anyone there?").await;
        assert!(matches!(state, WidgetState::Error(_)));

        let last = chat.messages().last().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.content, APOLOGY_ERROR);
        assert_eq!(chat.selection(), Some("a selection worth keeping"));
    }

    #[tokio::test]
    async fn test_missing_response_field_is_failure() {
        let backend = StubBackend::malformed();
        let mut chat = ChatWidget::new("intro");

        let state = chat.send(&backend, "Hello").await;
        assert!(matches!(state, WidgetState::Error(_)));
        assert_eq!(chat.messages().last().unwrap().content, APOLOGY_ERROR);
    }

    #[test]
    fn test_apology_for_transport_failure() {
        assert_eq!(apology(&FolioError::Timeout { timeout: 5 }), APOLOGY_UNAVAILABLE);
        assert_eq!(apology(&FolioError::MalformedResponse { field: "response" }), APOLOGY_ERROR);
    }

    #[tokio::test]
    async fn test_new_chat_clears_log_and_selection() {
        let backend = StubBackend::default();
        let mut chat = ChatWidget::new("intro");
        chat.send(&backend, "Hi").await;
        chat.select_text("another long selection");

        chat.new_chat();

        assert!(chat.messages().is_empty());
        assert!(chat.selection().is_none());
        assert!(chat.conversation_id().is_none());
        assert_eq!(chat.state(), &WidgetState::Idle);
    }

    #[test]
    fn test_message_serializes_role_lowercase() {
        let message = ChatMessage::user("hi");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["role"], "user");
        assert!(value["timestamp"].as_str().is_some());
    }
}
