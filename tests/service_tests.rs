// Integration tests for the HTTP session service client
//
// Each test runs against a local wiremock server standing in for the backend.

mod common;

use base64::Engine;
use common::wav_bytes;
use serene_voice::error::ServiceError;
use serene_voice::service::{HttpSessionService, SessionService};
use serene_voice::{Persona, PersonaCatalog};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn persona() -> Persona {
    PersonaCatalog::default().get(0).clone()
}

fn client(server: &MockServer) -> HttpSessionService {
    HttpSessionService::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_create_session_posts_persona_and_duration() {
    let server = MockServer::start().await;
    let persona = persona();

    Mock::given(method("POST"))
        .and(path("/api/session"))
        .and(body_partial_json(json!({
            "voice_persona": persona.id,
            "duration_minutes": 20,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "session-42",
            "voice_persona": persona.id,
            "duration_minutes": 20,
            "status": "active",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client(&server).create_session(&persona, 20).await.unwrap();
    assert_eq!(created.id, "session-42");
    assert_eq!(created.duration_minutes, Some(20));
}

#[tokio::test]
async fn test_create_session_maps_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/session"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server).create_session(&persona(), 15).await.unwrap_err();
    assert!(matches!(err, ServiceError::Status { status: 500, .. }));
}

#[tokio::test]
async fn test_create_session_rejects_empty_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "" })))
        .mount(&server)
        .await;

    let err = client(&server).create_session(&persona(), 15).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_synthesize_speech_decodes_audio() {
    let server = MockServer::start().await;
    let persona = persona();
    let audio = wav_bytes(320);

    Mock::given(method("POST"))
        .and(path("/api/generate-speech"))
        .and(body_partial_json(json!({
            "message": "Breathe in slowly.",
            "voice_persona": persona.id,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "audio_data": base64::engine::general_purpose::STANDARD.encode(&audio),
            "message": "Breathe in slowly.",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bytes = client(&server)
        .synthesize_speech("Breathe in slowly.", &persona)
        .await
        .unwrap();
    assert_eq!(bytes, audio);
}

#[tokio::test]
async fn test_synthesize_speech_empty_audio_is_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate-speech"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "audio_data": "" })))
        .mount(&server)
        .await;

    let err = client(&server)
        .synthesize_speech("Hello", &persona())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_list_tracks() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/music/rain"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "category": "rain",
            "name": "Rain Sounds",
            "tracks": [
                { "id": "t1", "name": "Soft Rain", "artist": "Nature", "preview_url": "https://example.com/t1.mp3" },
                { "id": "t2", "name": "Storm", "artist": "Nature" }
            ]
        })))
        .mount(&server)
        .await;

    let tracks = client(&server).list_tracks("rain").await.unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].name, "Soft Rain");
    assert!(tracks[1].preview_url.is_none());
}

#[tokio::test]
async fn test_list_tracks_unknown_category() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/music/unknown"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server).list_tracks("unknown").await.unwrap_err();
    assert!(matches!(err, ServiceError::Status { status: 404, .. }));
}
