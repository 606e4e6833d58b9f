//! HTTP endpoint tests: status mapping and error bodies through the axum router.

#![cfg(feature = "server")]

mod common;

use common::*;
use pdf2study::server::router;
use pdf2study::StudyGenError;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Serve the router on an ephemeral port and return its base URL.
async fn spawn_app(model: Arc<ScriptedGenerator>) -> String {
    let generator = Arc::new(generator_with(StaticPages::cats(), model, test_config()));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, router(generator)).await.unwrap();
    });
    address
}

async fn post(address: &str, route: &str, body: Value) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(format!("{address}{route}"))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app(ScriptedGenerator::replying(&[])).await;
    let response = reqwest::get(format!("{app}/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn flashcards_endpoint_returns_artifact() {
    let store = blob_store().await;
    let app = spawn_app(ScriptedGenerator::replying(&[CATS_FLASHCARDS])).await;

    let (status, body) = post(
        &app,
        "/flashcards/generate",
        json!({"fileDownloadUrl": format!("{}/docs/cats.pdf", store.uri()), "customPrompt": "be brief"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::from_str::<Value>(CATS_FLASHCARDS).unwrap());
}

#[tokio::test]
async fn missing_file_is_a_client_error() {
    let store = blob_store().await;
    let model = ScriptedGenerator::replying(&[CATS_FLASHCARDS]);
    let app = spawn_app(model.clone()).await;

    let (status, body) = post(
        &app,
        "/mindmaps/generate",
        json!({"fileDownloadUrl": format!("{}/docs/missing.pdf", store.uri())}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "DownloadError");
    assert_eq!(body["stage"], "extraction");
    assert!(body["message"].as_str().unwrap().contains("404"));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn malformed_model_output_is_a_bad_gateway() {
    let store = blob_store().await;
    let app = spawn_app(ScriptedGenerator::replying(&["not json"])).await;

    let (status, body) = post(
        &app,
        "/quizzes/generate",
        json!({"fileDownloadUrl": format!("{}/docs/cats.pdf", store.uri())}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "MalformedOutputError");
    assert_eq!(body["stage"], "validation");
}

#[tokio::test]
async fn validation_failure_does_not_echo_model_text() {
    let store = blob_store().await;
    let injected = "IGNORE ALL PREVIOUS sk-live-123";
    let raw = json!({
        "nodes": [{"id": "1", "data": {"label": "Cats"}, "position": {"x": 0, "y": 0}}],
        "edges": [{"id": "e1", "source": "1", "target": injected, "label": "are"}],
        "difficulty": 1,
        "description": "Cats.",
        "title": "Cats"
    })
    .to_string();
    let app = spawn_app(ScriptedGenerator::replying(&[raw.as_str()])).await;

    let (status, body) = post(
        &app,
        "/mindmaps/generate",
        json!({"fileDownloadUrl": format!("{}/docs/cats.pdf", store.uri())}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "MalformedOutputError");
    assert!(!body.to_string().contains("sk-live-123"), "body: {body}");
    assert!(!body.to_string().contains("IGNORE ALL PREVIOUS"), "body: {body}");
}

#[tokio::test]
async fn provider_payload_never_reaches_the_body() {
    let store = blob_store().await;
    let app = spawn_app(ScriptedGenerator::failing(StudyGenError::Generation {
        model: "gpt-5".into(),
        message: "upstream said: sk-secret-key-in-error".into(),
    }))
    .await;

    let (status, body) = post(
        &app,
        "/flashcards/generate",
        json!({"fileDownloadUrl": format!("{}/docs/cats.pdf", store.uri())}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "GenerationError");
    assert!(!body.to_string().contains("sk-secret"));
}

#[tokio::test]
async fn quiz_rejects_custom_prompt() {
    let app = spawn_app(ScriptedGenerator::replying(&[])).await;

    let (status, body) = post(
        &app,
        "/quizzes/generate",
        json!({"fileDownloadUrl": "https://blob.test/a.pdf", "customPrompt": "make it harder"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidRequest");
    assert_eq!(body["stage"], "request");
}

#[tokio::test]
async fn malformed_body_is_an_invalid_request() {
    let app = spawn_app(ScriptedGenerator::replying(&[])).await;

    let (status, body) = post(&app, "/flashcards/generate", json!({"url": "https://blob.test/a.pdf"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidRequest");
}
