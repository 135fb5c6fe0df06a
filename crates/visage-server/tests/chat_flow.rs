use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use visage_server::{app, config::Config, AppState};

/// State wired for offline tests: the inference service points at a closed
/// port with autostart disabled, and media lives in a temp directory.
fn test_state(media_dir: &std::path::Path) -> AppState {
    let mut config = Config::default();
    config.llm.url = "http://127.0.0.1:9".to_string();
    config.llm.autostart = false;
    config.media.dir = media_dir.to_string_lossy().into_owned();
    AppState::from_config(&config)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_check_returns_ok() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(test_state(dir.path()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn empty_chat_returns_two_beat_greeting() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(test_state(dir.path()));

    let response = app.oneshot(post_json("/chat", json!({}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["facialExpression"], "smile");
    assert_eq!(messages[1]["animation"], "Crying");
    for beat in messages {
        assert_eq!(beat["audioMime"], "audio/wav");
        let cues = beat["lipsync"]["mouthCues"].as_array().unwrap();
        assert!(!cues.is_empty());
        // No pre-rendered intro assets in a temp dir: the synthesized
        // timeline covers the default window.
        let end = cues.last().unwrap()["end"].as_f64().unwrap();
        assert!(end > 0.0);
    }
}

#[tokio::test]
async fn chat_with_message_returns_renderable_beats_and_records_history() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());
    let sessions = state.sessions.clone();
    let app = app(state);

    let response = app
        .oneshot(post_json(
            "/chat",
            json!({ "message": "hello", "sessionId": "t1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let messages = json["messages"].as_array().unwrap();
    assert!(!messages.is_empty() && messages.len() <= 3);
    for beat in messages {
        assert_eq!(beat["audioMime"], "audio/wav");
        assert!(!beat["text"].as_str().unwrap().is_empty());
        assert!(!beat["lipsync"]["mouthCues"].as_array().unwrap().is_empty());
    }
    // The inference service is unreachable, so the canned beat comes back.
    assert_eq!(messages[0]["text"], "I'm here and listening.");

    // The exchange was recorded: one user turn, one assistant turn.
    let history = sessions.history("t1");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "hello");
}

#[tokio::test]
async fn reset_clears_history_before_the_turn() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());
    let sessions = state.sessions.clone();
    sessions.append_exchange("t2", "old question", "old answer");
    let app = app(state);

    let response = app
        .oneshot(post_json(
            "/chat",
            json!({ "sessionId": "t2", "reset": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // No message and no images: greeting path, nothing recorded.
    assert!(sessions.history("t2").is_empty());
}

#[tokio::test]
async fn session_id_falls_back_to_header() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());
    let sessions = state.sessions.clone();
    let app = app(state);

    let request = Request::builder()
        .uri("/chat")
        .method("POST")
        .header("content-type", "application/json")
        .header("x-session-id", "from-header")
        .body(Body::from(json!({ "message": "hi" }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(sessions.history("from-header").len(), 2);
}

#[tokio::test]
async fn transcribe_requires_audio() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(test_state(dir.path()));

    let response = app
        .oneshot(post_json("/transcribe", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("audio"));
}

#[tokio::test]
async fn websearch_requires_query() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(test_state(dir.path()));

    let response = app
        .oneshot(post_json("/websearch", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn websearch_answers_datetime_locally() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(test_state(dir.path()));

    let response = app
        .oneshot(post_json("/websearch", json!({ "q": "what's the time now" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["heading"], "Current date & time");
    assert!(!json["abstract"].as_str().unwrap().is_empty());
}
