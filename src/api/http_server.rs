// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use super::analyze::analyze_handler;
use super::handlers::{health_handler, models_handler};
use crate::config::{DetectionConfig, DEFAULT_MAX_BODY_BYTES};
use crate::detection::DetectionService;

#[derive(Clone)]
pub struct AppState {
    pub detection: DetectionService,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(detection: DetectionService) -> Self {
        Self {
            detection,
            started_at: Instant::now(),
        }
    }
}

/// Build the router with the default body limit
pub fn create_app(state: AppState) -> Router {
    create_app_with_limit(state, DEFAULT_MAX_BODY_BYTES)
}

pub fn create_app_with_limit(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Configured models
        .route("/api/models", get(models_handler))
        // Multi-model analysis
        .route("/api/analyze", post(analyze_handler))
        // Replace axum's 2MB default with the configured limit
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind the configured address and serve until ctrl-c
pub async fn start_server(
    config: &DetectionConfig,
    detection: DetectionService,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let app = create_app_with_limit(AppState::new(detection), config.max_body_bytes);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("API server listening on {}", listener.local_addr()?);
    tracing::info!("  POST /api/analyze - JSON base64 image");
    tracing::info!("  GET  /api/models  - Configured models");
    tracing::info!("  GET  /health      - Health check");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
