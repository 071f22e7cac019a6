//! In-process [`Backend`] that records requests, for widget tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};

use crate::api::{
    CHAT_QUERY_PATH, ChatQuery, ChatReply, LOGIN_PATH, LoginRequest, PERSONALIZE_PATH, PersonalizeRequest,
    Personalization, SIGNUP_PATH, SignupRequest, TRANSLATE_PATH, TranslateRequest, Translation,
};
use crate::client::Backend;
use crate::{FolioError, Result};

#[derive(Debug, Default)]
pub(crate) struct StubBackend {
    status: Option<u16>,
    malformed: bool,
    requests: Mutex<Vec<(&'static str, Value)>>,
}

impl StubBackend {
    /// Every call fails with `status`.
    pub fn failing(status: u16) -> Self {
        Self { status: Some(status), ..Default::default() }
    }

    /// Every call answers `200 {}`.
    pub fn malformed() -> Self {
        Self { malformed: true, ..Default::default() }
    }

    pub fn requests(&self) -> Vec<(&'static str, Value)> {
        self.requests.lock().unwrap().clone()
    }

    fn record<T: Serialize>(&self, path: &'static str, body: &T, field: &'static str) -> Result<()> {
        self.requests.lock().unwrap().push((path, serde_json::to_value(body).unwrap()));

        if let Some(status) = self.status {
            return Err(FolioError::Status { status, detail: "Internal Server Error".to_string() });
        }
        if self.malformed {
            return Err(FolioError::MalformedResponse { field });
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for StubBackend {
    async fn chat(&self, query: &ChatQuery) -> Result<ChatReply> {
        self.record(CHAT_QUERY_PATH, query, "response")?;
        Ok(ChatReply {
            response: format!("About {}: {}", query.chapter, query.query),
            sources: vec![],
            conversation_id: Some("conv-1".to_string()),
        })
    }

    async fn translate(&self, request: &TranslateRequest) -> Result<Translation> {
        self.record(TRANSLATE_PATH, request, "translated_content")?;
        Ok(Translation {
            content: "<p>روبوٹکس</p>".to_string(),
            target_language: request.target_language.clone(),
            tokens_used: Some(12),
            estimated_cost_usd: Some(0.000024),
        })
    }

    async fn personalize(&self, request: &PersonalizeRequest) -> Result<Personalization> {
        self.record(PERSONALIZE_PATH, request, "personalized_content")?;
        Ok(Personalization { content: format!("<p>{} version</p>", request.user_level), level: request.user_level })
    }

    async fn signup(&self, request: &SignupRequest) -> Result<Value> {
        self.record(SIGNUP_PATH, request, "id")?;
        Ok(json!({"id": 1, "email": request.email}))
    }

    async fn login(&self, request: &LoginRequest) -> Result<String> {
        self.record(LOGIN_PATH, request, "access_token")?;
        Ok(format!("token-for-{}", request.email))
    }
}
