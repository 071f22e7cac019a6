//! Remote invoker for the reader-assist backend.
//!
//! [`ApiClient`] issues exactly one `POST` with a JSON body per call and maps
//! the outcome onto [`crate::FolioError`]. There is no retry and, unless one
//! is configured, no client-side timeout: completion is up to the backend or
//! the transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::api::{
    CHAT_QUERY_PATH, ChatQuery, ChatQueryResponse, ChatReply, ErrorBody, LOGIN_PATH, LoginRequest, LoginResponse,
    PERSONALIZE_PATH, PersonalizeRequest, PersonalizeResponse, Personalization, SIGNUP_PATH, SignupRequest,
    TRANSLATE_PATH, TranslateRequest, TranslateResponse, Translation,
};
use crate::{FolioError, Result};

/// HTTP settings for talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend origin, optionally with a path prefix.
    pub base_url: String,
    /// Request timeout in seconds; `None` waits for the backend indefinitely.
    pub timeout: Option<u64>,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout: None,
            user_agent: concat!("folio/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// The backend operations widgets depend on.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `POST /api/chat/query`; succeeds only with a `response` field.
    async fn chat(&self, query: &ChatQuery) -> Result<ChatReply>;

    /// `POST /api/translate`; succeeds only with a `translated_content` field.
    async fn translate(&self, request: &TranslateRequest) -> Result<Translation>;

    /// `POST /api/personalize`; succeeds only with a `personalized_content` field.
    async fn personalize(&self, request: &PersonalizeRequest) -> Result<Personalization>;

    /// `POST /api/auth/signup`; the body is opaque.
    async fn signup(&self, request: &SignupRequest) -> Result<serde_json::Value>;

    /// `POST /api/auth/login`; returns the access token.
    async fn login(&self, request: &LoginRequest) -> Result<String>;
}

/// reqwest-backed [`Backend`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    config: ApiConfig,
    token: Option<String>,
}

impl ApiClient {
    /// Build a client for `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::InvalidUrl`] when the base URL does not parse or
    /// is not http(s).
    pub fn new(config: ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| FolioError::InvalidUrl(e.to_string()))?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(FolioError::InvalidUrl(format!(
                "backend URL must be http:// or https://, got {}",
                config.base_url
            )));
        }

        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        let client = builder.build().map_err(FolioError::HttpError)?;

        Ok(Self { client, base_url, config, token: None })
    }

    /// Attach a bearer token to every request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// The configured backend URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let joined = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|e| FolioError::InvalidUrl(e.to_string()))
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");

        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(body);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.map_transport(e))?;

        if !status.is_success() {
            let detail = error_detail(&bytes)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            debug!(status = status.as_u16(), %detail, "backend error");
            return Err(FolioError::Status { status: status.as_u16(), detail });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    fn map_transport(&self, err: reqwest::Error) -> FolioError {
        match self.config.timeout {
            Some(timeout) if err.is_timeout() => FolioError::Timeout { timeout },
            _ => FolioError::HttpError(err),
        }
    }
}

/// The `detail` of a JSON error body, as text
fn error_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn chat(&self, query: &ChatQuery) -> Result<ChatReply> {
        let body: ChatQueryResponse = self.post_json(CHAT_QUERY_PATH, query).await?;
        let response = body.response.ok_or(FolioError::MalformedResponse { field: "response" })?;

        Ok(ChatReply { response, sources: body.sources, conversation_id: body.conversation_id })
    }

    async fn translate(&self, request: &TranslateRequest) -> Result<Translation> {
        let body: TranslateResponse = self.post_json(TRANSLATE_PATH, request).await?;
        let content = body
            .translated_content
            .ok_or(FolioError::MalformedResponse { field: "translated_content" })?;

        if body.tokens_used.is_some() || body.estimated_cost_usd.is_some() {
            debug!(
                tokens_used = body.tokens_used,
                estimated_cost_usd = body.estimated_cost_usd,
                "translation usage"
            );
        }

        Ok(Translation {
            content,
            target_language: request.target_language.clone(),
            tokens_used: body.tokens_used,
            estimated_cost_usd: body.estimated_cost_usd,
        })
    }

    async fn personalize(&self, request: &PersonalizeRequest) -> Result<Personalization> {
        let body: PersonalizeResponse = self.post_json(PERSONALIZE_PATH, request).await?;
        let content = body
            .personalized_content
            .ok_or(FolioError::MalformedResponse { field: "personalized_content" })?;

        Ok(Personalization { content, level: request.user_level })
    }

    async fn signup(&self, request: &SignupRequest) -> Result<serde_json::Value> {
        self.post_json(SIGNUP_PATH, request).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<String> {
        let body: LoginResponse = self.post_json(LOGIN_PATH, request).await?;
        body.access_token.ok_or(FolioError::MalformedResponse { field: "access_token" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_config_default() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert!(config.timeout.is_none());
        assert!(config.user_agent.starts_with("folio/"));
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ApiConfig { base_url: "not-a-url".to_string(), ..Default::default() };
        assert!(matches!(ApiClient::new(config), Err(FolioError::InvalidUrl(_))));
    }

    #[test]
    fn test_non_http_base_url() {
        let config = ApiConfig { base_url: "ftp://example.com".to_string(), ..Default::default() };
        assert!(matches!(ApiClient::new(config), Err(FolioError::InvalidUrl(_))));
    }

    #[test]
    fn test_endpoint_keeps_path_prefix() {
        let config = ApiConfig { base_url: "https://example.com/backend/".to_string(), ..Default::default() };
        let client = ApiClient::new(config).unwrap();
        assert_eq!(
            client.endpoint(TRANSLATE_PATH).unwrap().as_str(),
            "https://example.com/backend/api/translate"
        );
    }

    #[test]
    fn test_error_detail_variants() {
        assert_eq!(
            error_detail(br#"{"detail": "Translation failed: quota"}"#),
            Some("Translation failed: quota".to_string())
        );
        assert_eq!(
            error_detail(br#"{"detail": [{"msg": "field required"}]}"#),
            Some(r#"[{"msg":"field required"}]"#.to_string())
        );
        assert_eq!(error_detail(b"Internal Server Error"), None);
        assert_eq!(error_detail(b"{}"), None);
    }
}
