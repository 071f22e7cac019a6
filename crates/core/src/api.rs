//! Request and response bodies of the reader-assist backend.
//!
//! Response types keep every field optional so that a `200 OK` with a missing
//! field can be told apart from a decode failure; the client turns a missing
//! expected field into [`crate::FolioError::MalformedResponse`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const CHAT_QUERY_PATH: &str = "/api/chat/query";
pub const TRANSLATE_PATH: &str = "/api/translate";
pub const PERSONALIZE_PATH: &str = "/api/personalize";
pub const SIGNUP_PATH: &str = "/api/auth/signup";
pub const LOGIN_PATH: &str = "/api/auth/login";

/// Body of `POST /api/chat/query`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatQuery {
    pub query: String,
    /// Text the reader selected on the page, if any
    pub context: Option<String>,
    pub chapter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ChatQueryResponse {
    pub response: Option<String>,
    #[serde(default)]
    pub sources: Vec<serde_json::Value>,
    pub conversation_id: Option<String>,
}

/// A successful chat answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub sources: Vec<serde_json::Value>,
    pub conversation_id: Option<String>,
}

/// Body of `POST /api/translate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub content: String,
    pub target_language: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TranslateResponse {
    pub translated_content: Option<String>,
    pub tokens_used: Option<u64>,
    pub estimated_cost_usd: Option<f64>,
}

/// A successful translation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translation {
    /// HTML-bearing translated text
    pub content: String,
    pub target_language: String,
    pub tokens_used: Option<u64>,
    pub estimated_cost_usd: Option<f64>,
}

/// Reader skill level for personalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(format!("Invalid level: {}. Valid options: beginner, intermediate, advanced", s)),
        }
    }
}

/// Body of `POST /api/personalize`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalizeRequest {
    pub content: String,
    pub chapter: String,
    pub user_level: SkillLevel,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct PersonalizeResponse {
    pub personalized_content: Option<String>,
}

/// A successful personalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Personalization {
    /// HTML-bearing rewritten text
    pub content: String,
    pub level: SkillLevel,
}

/// Body of `POST /api/auth/signup`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub programming_experience: String,
    pub robotics_background: String,
    pub hardware_access: String,
}

impl SignupRequest {
    /// A signup with the questionnaire's default answers
    pub fn new(email: impl Into<String>, password: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            full_name: full_name.into(),
            programming_experience: "beginner".to_string(),
            robotics_background: "none".to_string(),
            hardware_access: "basic_pc".to_string(),
        }
    }
}

/// Body of `POST /api/auth/login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LoginResponse {
    pub access_token: Option<String>,
}

/// FastAPI-style error body
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: Option<serde_json::Value>,
}
