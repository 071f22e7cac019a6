//! Reader-assist widgets for documentation sites.
//!
//! `folio-core` pulls the primary chapter text out of a rendered docs page,
//! guards it with a character budget, and drives the translate, personalize
//! and chat widgets against a backend.
//!
//! ```rust
//! use folio_core::{BudgetConfig, Budgeted, Document, NeverConfirm, extract_primary_text};
//!
//! let doc = Document::parse("<article><p>Actuators turn commands into motion.</p></article>").unwrap();
//! let content = extract_primary_text(&doc).unwrap();
//!
//! let payload = BudgetConfig::default().apply(content, &mut NeverConfirm).unwrap();
//! assert!(matches!(payload, Budgeted::Ready(_)));
//! ```

pub mod api;
pub mod budget;
pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod parse;
pub mod preprocess;
pub mod session;
pub mod source;
pub mod text;
pub mod widget;

pub use api::{
    ChatQuery, ChatReply, LoginRequest, PersonalizeRequest, Personalization, SignupRequest, SkillLevel,
    TranslateRequest, Translation,
};
pub use budget::{AlwaysConfirm, BudgetConfig, Budgeted, Confirm, NeverConfirm, TruncationNotice};
pub use client::{ApiClient, ApiConfig, Backend};
pub use config::{FolioConfig, FolioConfigBuilder};
pub use error::{FolioError, Result};
pub use extract::{ChapterContent, ExtractConfig, ExtractedContent, extract_content, extract_primary_text};
pub use fetch::{FetchConfig, fetch_file, fetch_stdin, fetch_url};
pub use parse::Document;
#[doc(hidden)]
pub use preprocess::PreprocessConfig;
pub use preprocess::preprocess_html;
pub use session::{FileStore, MemoryStore, Session, SessionStore, User};
pub use source::{ContentSource, HtmlSource, TextSource};
pub use widget::{ChatMessage, ChatRole, ChatWidget, PersonalizeWidget, TranslateWidget, Widget, WidgetState};
