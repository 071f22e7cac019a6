//! Backend client integration tests against an in-process HTTP server
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use folio_core::*;
use serde_json::{Value, json};

type Seen = Arc<Mutex<Vec<Value>>>;

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

async fn spawn(router: Router) -> ApiClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    ApiClient::new(ApiConfig { base_url: format!("http://{addr}"), ..Default::default() }).unwrap()
}

fn recording(path: &str, reply: Value) -> (Router, Seen) {
    let seen: Seen = Arc::default();
    let router = Router::new()
        .route(
            path,
            post(move |State(seen): State<Seen>, Json(body): Json<Value>| {
                let reply = reply.clone();
                async move {
                    seen.lock().unwrap().push(body);
                    Json(reply)
                }
            }),
        )
        .with_state(seen.clone());
    (router, seen)
}

fn translate_request(content: &str) -> TranslateRequest {
    TranslateRequest { content: content.to_string(), target_language: "ur".to_string() }
}

#[tokio::test]
async fn test_translate_success_with_usage() {
    let (router, seen) = recording(
        "/api/translate",
        json!({"translated_content": "<p>سلام</p>", "tokens_used": 42, "estimated_cost_usd": 0.000084}),
    );
    let client = spawn(router).await;

    let translation = client.translate(&translate_request("Hello, robotics readers")).await.unwrap();
    assert_eq!(translation.content, "<p>سلام</p>");
    assert_eq!(translation.tokens_used, Some(42));
    assert_eq!(seen.lock().unwrap()[0], json!({"content": "Hello, robotics readers", "target_language": "ur"}));
}

#[tokio::test]
async fn test_translate_without_usage_still_succeeds() {
    let (router, _) = recording("/api/translate", json!({"translated_content": "ok"}));
    let client = spawn(router).await;

    let translation = client.translate(&translate_request("Hello, robotics readers")).await.unwrap();
    assert_eq!(translation.content, "ok");
    assert!(translation.estimated_cost_usd.is_none());
}

#[tokio::test]
async fn test_server_error_carries_detail() {
    let router = Router::new().route(
        "/api/translate",
        post(|| async {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"detail": "Translation failed: quota exceeded"})))
        }),
    );
    let client = spawn(router).await;

    let err = client.translate(&translate_request("Hello, robotics readers")).await.unwrap_err();
    match err {
        FolioError::Status { status, detail } => {
            assert_eq!(status, 500);
            assert_eq!(detail, "Translation failed: quota exceeded");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_plain_text_error_uses_status_reason() {
    let router = Router::new().route("/api/personalize", post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }));
    let client = spawn(router).await;

    let request = PersonalizeRequest {
        content: "Kinematics chapter".to_string(),
        chapter: "module-3".to_string(),
        user_level: SkillLevel::Beginner,
    };
    let err = client.personalize(&request).await.unwrap_err();
    assert!(matches!(err, FolioError::Status { status: 502, ref detail } if detail == "Bad Gateway"));
}

#[tokio::test]
async fn test_empty_object_is_malformed() {
    let (router, _) = recording("/api/translate", json!({}));
    let client = spawn(router).await;

    let err = client.translate(&translate_request("Hello, robotics readers")).await.unwrap_err();
    assert!(matches!(err, FolioError::MalformedResponse { field: "translated_content" }));
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let router = Router::new().route("/api/chat/query", post(|| async { "definitely not json" }));
    let client = spawn(router).await;

    let query = ChatQuery { query: "Hi".to_string(), context: None, chapter: "intro".to_string(), conversation_id: None };
    let err = client.chat(&query).await.unwrap_err();
    assert!(matches!(err, FolioError::DecodeError(_)));
}

#[tokio::test]
async fn test_configured_timeout() {
    let router = Router::new().route(
        "/api/translate",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({"translated_content": "late"}))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let client =
        ApiClient::new(ApiConfig { base_url: format!("http://{addr}"), timeout: Some(1), ..Default::default() })
            .unwrap();
    let err = client.translate(&translate_request("Hello, robotics readers")).await.unwrap_err();
    assert!(matches!(err, FolioError::Timeout { timeout: 1 }));
}

#[tokio::test]
async fn test_connection_refused_is_http_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(ApiConfig { base_url: format!("http://{addr}"), ..Default::default() }).unwrap();
    let err = client.translate(&translate_request("Hello, robotics readers")).await.unwrap_err();
    assert!(matches!(err, FolioError::HttpError(_)));
}

#[tokio::test]
async fn test_bearer_token_is_attached() {
    let router = Router::new().route(
        "/api/chat/query",
        post(|headers: HeaderMap| async move {
            let auth = headers.get("authorization").and_then(|v| v.to_str().ok()).unwrap_or("").to_string();
            Json(json!({"response": auth, "sources": [], "conversation_id": "c-9"}))
        }),
    );
    let client = spawn(router).await.with_token(Some("abc123".to_string()));

    let query = ChatQuery { query: "Hi".to_string(), context: None, chapter: "intro".to_string(), conversation_id: None };
    let reply = client.chat(&query).await.unwrap();
    assert_eq!(reply.response, "Bearer abc123");
    assert_eq!(reply.conversation_id.as_deref(), Some("c-9"));
}

#[tokio::test]
async fn test_login_and_signup_flow() {
    let seen: Seen = Arc::default();
    let router = Router::new()
        .route(
            "/api/auth/signup",
            post(|State(seen): State<Seen>, Json(body): Json<Value>| async move {
                seen.lock().unwrap().push(body);
                Json(json!({"id": 7}))
            }),
        )
        .route(
            "/api/auth/login",
            post(|Json(body): Json<Value>| async move {
                Json(json!({"access_token": format!("jwt-{}", body["email"].as_str().unwrap_or(""))}))
            }),
        )
        .with_state(seen.clone());
    let client = spawn(router).await;

    let mut session = Session::new(MemoryStore::new());
    let user = session.signup(&client, &SignupRequest::new("lin@example.com", "pw", "Lin Wei")).await.unwrap();

    assert_eq!(user.name, "Lin Wei");
    assert_eq!(session.token(), Some("jwt-lin@example.com".to_string()));
    assert_eq!(seen.lock().unwrap()[0]["robotics_background"], "none");
}

#[tokio::test]
async fn test_login_without_token_is_malformed() {
    let (router, _) = recording("/api/auth/login", json!({"token_type": "bearer"}));
    let client = spawn(router).await;

    let mut session = Session::new(MemoryStore::new());
    let err = session.login(&client, "a@b.c", "pw").await.unwrap_err();
    assert!(matches!(err, FolioError::MalformedResponse { field: "access_token" }));
    assert!(session.load().is_none());
}

#[tokio::test]
async fn test_translate_widget_end_to_end() {
    let (router, seen) = recording("/api/translate", json!({"translated_content": "<h1>ROS 2</h1>"}));
    let client = spawn(router).await;

    let html = std::fs::read_to_string(get_fixture_path("docusaurus_chapter.html")).unwrap();
    let source = HtmlSource::parse(&html, ExtractConfig::default()).unwrap();
    let mut widget = TranslateWidget::new("ur", BudgetConfig::default());

    let state = widget.run(&client, &source, &mut NeverConfirm).await;
    assert!(matches!(state, WidgetState::Success(t) if t.content == "<h1>ROS 2</h1>"));

    let sent = seen.lock().unwrap()[0]["content"].as_str().unwrap().to_string();
    assert!(sent.starts_with("ROS 2 Basics"));
    assert!(!sent.contains("Translate to Urdu"));
    assert!(!sent.contains("Next: URDF"));
}

#[tokio::test]
async fn test_translate_widget_server_error_then_retry() {
    let calls = Arc::new(Mutex::new(0u32));
    let router = Router::new()
        .route(
            "/api/translate",
            post(|State(calls): State<Arc<Mutex<u32>>>| async move {
                let mut calls = calls.lock().unwrap();
                *calls += 1;
                if *calls == 1 {
                    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"detail": "busy"})))
                } else {
                    (StatusCode::OK, Json(json!({"translated_content": "ترجمہ"})))
                }
            }),
        )
        .with_state(calls.clone());
    let client = spawn(router).await;

    let source = TextSource::new("Balance control keeps a humanoid upright.");
    let mut widget = TranslateWidget::new("ur", BudgetConfig::default());

    let state = widget.run(&client, &source, &mut NeverConfirm).await;
    assert!(matches!(state, WidgetState::Error(message) if message.contains("busy")));

    let state = widget.run(&client, &source, &mut NeverConfirm).await;
    assert!(matches!(state, WidgetState::Success(_)));
    assert_eq!(*calls.lock().unwrap(), 2);
}
