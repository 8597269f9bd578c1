// Integration tests for the HTTP API
//
// The router is driven in-process with tower's oneshot; the chat and
// transcription upstreams are mocks, so these tests cover the wire
// contracts without any network.

use audiobook_assistant::chat::{ChatBackend, MockChatBackend};
use audiobook_assistant::session::{AudiobookSession, SchedulerConfig};
use audiobook_assistant::transcribe::{MockTranscriber, Transcriber};
use audiobook_assistant::{create_router, AppState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    chat: Arc<MockChatBackend>,
    transcriber: Arc<MockTranscriber>,
}

fn test_app(chat: MockChatBackend, transcriber: MockTranscriber, uploads_dir: &Path) -> TestApp {
    let chat = Arc::new(chat);
    let transcriber = Arc::new(transcriber);

    let session = AudiobookSession::new(
        Arc::clone(&chat) as Arc<dyn ChatBackend>,
        Arc::clone(&transcriber) as Arc<dyn Transcriber>,
        SchedulerConfig::default(),
    );

    let router = create_router(AppState {
        session,
        transcriber: Arc::clone(&transcriber) as Arc<dyn Transcriber>,
        uploads_dir: uploads_dir.to_path_buf(),
        max_upload_bytes: 16 * 1024 * 1024,
    });

    TestApp {
        router,
        chat,
        transcriber,
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// ----------------------------------------------------------------------------
// Multipart helpers
// ----------------------------------------------------------------------------

const BOUNDARY: &str = "test-boundary";

fn file_field(name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
             filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    out.extend_from_slice(bytes);
    out.extend_from_slice(b"\r\n");
    out
}

fn text_field(name: &str, value: &str) -> Vec<u8> {
    format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
        .into_bytes()
}

fn multipart_request(uri: &str, mut fields: Vec<Vec<u8>>) -> Request<Body> {
    let mut body = Vec::new();
    for field in fields.drain(..) {
        body.extend_from_slice(&field);
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// One second of silence, 16kHz mono WAV.
fn wav_fixture() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..16000 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[tokio::test]
async fn health_check_responds_ok() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(MockChatBackend::new(), MockTranscriber::new(), dir.path());

    let response = app.router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn chat_without_context_uses_the_fixed_marker_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(
        MockChatBackend::new().with_reply("hello there"),
        MockTranscriber::new(),
        dir.path(),
    );

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "/api/chat",
            serde_json::json!({ "message": "hi", "audiobookContext": null }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "hello there");
    assert_eq!(app.chat.prompts(), vec!["No audiobook playing".to_string()]);

    let history = app
        .router
        .oneshot(get("/api/chat/history"))
        .await
        .unwrap();
    let history = body_json(history).await;
    assert_eq!(history.as_array().unwrap().len(), 2);
    assert_eq!(history[0]["role"], "user");
    assert_eq!(history[1]["role"], "assistant");
}

#[tokio::test]
async fn chat_context_reaches_the_system_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(MockChatBackend::new(), MockTranscriber::new(), dir.path());

    let response = app
        .router
        .oneshot(json_request(
            "/api/chat",
            serde_json::json!({
                "message": "what just happened?",
                "audiobookContext": {
                    "fileName": "moby-dick.mp3",
                    "currentTime": 42.0,
                    "duration": 3600.0,
                    "isPlaying": true,
                    "context": "Call me Ishmael."
                }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let prompts = app.chat.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Call me Ishmael."));
}

#[tokio::test]
async fn transcribe_forwards_the_requested_window() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(
        MockChatBackend::new(),
        MockTranscriber::new().with_response("and so it ends"),
        dir.path(),
    );

    let response = app
        .router
        .oneshot(multipart_request(
            "/api/transcribe",
            vec![
                file_field("audio", "book.wav", "audio/wav", &wav_fixture()),
                text_field("startTime", "26"),
                text_field("endTime", "40"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["text"], "and so it ends");

    let windows = app.transcriber.windows();
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].start_seconds, 26.0);
    assert_eq!(windows[0].end_seconds, 40.0);
}

#[tokio::test]
async fn transcribe_without_audio_is_a_client_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(MockChatBackend::new(), MockTranscriber::new(), dir.path());

    let response = app
        .router
        .oneshot(multipart_request(
            "/api/transcribe",
            vec![text_field("startTime", "0"), text_field("endTime", "30")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("No audio file"));
}

#[tokio::test]
async fn upload_stores_the_file_and_loads_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(MockChatBackend::new(), MockTranscriber::new(), dir.path());

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(
            "/api/upload",
            vec![file_field("file", "test.wav", "audio/wav", &wav_fixture())],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["filename"], "test.wav");
    let file_url = body["fileUrl"].as_str().unwrap().to_string();
    assert!(file_url.starts_with("/uploads/"));
    assert!(file_url.ends_with(".wav"));

    // The stored copy is on disk under the uploads dir.
    let stored = dir.path().join(file_url.trim_start_matches("/uploads/"));
    assert!(stored.exists());

    let status = app
        .router
        .oneshot(get("/api/player/status"))
        .await
        .unwrap();
    let status = body_json(status).await;
    assert_eq!(status["fileName"], "test.wav");
    assert_eq!(status["playback"]["durationSeconds"], 1.0);
    assert_eq!(status["playback"]["isPlaying"], false);
    assert_eq!(status["context"], "");
}

#[tokio::test]
async fn upload_rejects_non_audio_files() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(MockChatBackend::new(), MockTranscriber::new(), dir.path());

    let response = app
        .router
        .oneshot(multipart_request(
            "/api/upload",
            vec![file_field("file", "notes.txt", "text/plain", b"not audio")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("audio"));
}

#[tokio::test]
async fn upload_without_a_file_is_a_client_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(MockChatBackend::new(), MockTranscriber::new(), dir.path());

    let response = app
        .router
        .oneshot(multipart_request("/api/upload", vec![]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn player_controls_drive_the_clock() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(MockChatBackend::new(), MockTranscriber::new(), dir.path());

    // Nothing loaded yet: play and seek are conflicts.
    let response = app
        .router
        .clone()
        .oneshot(empty_post("/api/player/play"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(
            "/api/upload",
            vec![file_field("file", "test.wav", "audio/wav", &wav_fixture())],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .clone()
        .oneshot(empty_post("/api/player/play"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["playback"]["isPlaying"], true);

    // Seek clamps to the 1s fixture.
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "/api/player/seek",
            serde_json::json!({ "position": 30.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["playback"]["positionSeconds"], 1.0);

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "/api/player/volume",
            serde_json::json!({ "volume": 0.5 }),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["playback"]["volume"], 0.5);

    let response = app
        .router
        .oneshot(empty_post("/api/player/pause"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["playback"]["isPlaying"], false);
}
