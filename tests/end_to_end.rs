//! Session controller wired to the real HTTP backend and a mock server

use murmur::backend::HttpBackend;
use murmur::config::AppConfig;
use murmur::messages::{MessageKind, Role};
use murmur::session::SessionController;
use murmur::settings::SettingsStore;
use murmur::speech::LogSpeaker;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_conversation_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_string_contains("What is Rust?"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"response": "A systems language."})),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_string_contains("And Python?"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::default()
        .with_backend_url(&server.uri())
        .with_recordings_dir(dir.path());
    config.validate().unwrap();

    let (controller, _events) = SessionController::with_audio_format(
        SettingsStore::new(config.settings),
        Arc::new(HttpBackend::new(&config.backend).unwrap()),
        Arc::new(murmur::capture::DesktopCapture::new(&config.audio.recordings_dir)),
        Arc::new(LogSpeaker),
        config.audio.format(),
    );

    let reply = controller.send_text("What is Rust?").await.unwrap().unwrap();
    assert_eq!(reply.content.text(), Some("A systems language."));

    assert!(controller.send_text("And Python?").await.is_err());

    let messages = controller.messages();
    let shape: Vec<(Role, MessageKind)> = messages.iter().map(|m| (m.role, m.kind())).collect();
    assert_eq!(
        shape,
        [
            (Role::User, MessageKind::Text),
            (Role::Assistant, MessageKind::Text),
            (Role::User, MessageKind::Text),
        ]
    );
}
