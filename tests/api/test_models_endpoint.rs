// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Model listing and health tests for GET /api/models and GET /health

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use detection_relay::{
    api::http_server::{create_app, AppState},
    detection::{DetectionService, ModelTarget},
};
use serde_json::Value;
use tower::util::ServiceExt;

fn setup_state() -> AppState {
    let targets = vec![
        ModelTarget::hosted("waste-detection/1", "secret-one"),
        ModelTarget::new("trash/3", "secret-two", "https://detect.example.com/{id}"),
    ];
    AppState::new(DetectionService::hosted(targets, None).unwrap())
}

async fn get_json(uri: &str) -> (StatusCode, Value, String) {
    let app = create_app(setup_state());
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    (status, serde_json::from_str(&text).unwrap(), text)
}

#[tokio::test]
async fn test_list_models_in_configured_order() {
    let (status, body, _) = get_json("/api/models").await;

    assert_eq!(status, StatusCode::OK);
    let models = body["models"].as_array().unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[0]["id"], "waste-detection/1");
    assert_eq!(
        models[0]["endpoint"],
        "https://serverless.roboflow.com/waste-detection/1"
    );
    assert_eq!(models[1]["endpoint"], "https://detect.example.com/trash/3");
}

#[tokio::test]
async fn test_list_models_hides_credentials() {
    let (_, _, text) = get_json("/api/models").await;
    assert!(!text.contains("secret-one"));
    assert!(!text.contains("secret-two"));
}

#[tokio::test]
async fn test_health() {
    let (status, body, _) = get_json("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["models"], 2);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptimeSecs"].is_u64());
    assert!(body.get("uptime_secs").is_none());
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = create_app(setup_state());
    let request = Request::builder()
        .method(Method::GET)
        .uri("/v1/unknown")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
