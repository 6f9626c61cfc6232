// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-process stand-in for a hosted detection API

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the mock answers for one model id
#[derive(Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl Reply {
    pub fn ok(body: serde_json::Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn raw(body: &str) -> Self {
        Self::status(200, body)
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// One request as seen by the mock
#[derive(Debug, Clone)]
pub struct Recorded {
    pub model: String,
    pub query: HashMap<String, String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Clone)]
struct MockState {
    replies: Arc<HashMap<String, Reply>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

pub struct MockUpstream {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockUpstream {
    /// Start a mock answering each model id with its reply; unknown ids get 404
    pub async fn start(replies: Vec<(&str, Reply)>) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            replies: Arc::new(
                replies
                    .into_iter()
                    .map(|(id, reply)| (id.to_string(), reply))
                    .collect(),
            ),
            requests: requests.clone(),
        };

        let app = Router::new()
            .route("/*model", post(handle))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, requests }
    }

    /// Endpoint template routing `{id}` to this mock
    pub fn template(&self) -> String {
        format!("http://{}/{{id}}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn handle(
    State(state): State<MockState>,
    Path(model): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.requests.lock().unwrap().push(Recorded {
        model: model.clone(),
        query,
        content_type: headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let Some(reply) = state.replies.get(&model).cloned() else {
        return (StatusCode::NOT_FOUND, "unknown model").into_response();
    };

    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    (
        StatusCode::from_u16(reply.status).unwrap(),
        [(CONTENT_TYPE, "application/json")],
        reply.body,
    )
        .into_response()
}

/// Success body in the hosted API's shape
pub fn detection_body(predictions: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "inference_id": "00000000-0000-0000-0000-000000000000",
        "time": 0.05,
        "image": {"width": 1280, "height": 720},
        "predictions": predictions,
    })
}

/// Endpoint template for a local port nobody is listening on
pub fn closed_template() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/{{id}}", addr)
}
