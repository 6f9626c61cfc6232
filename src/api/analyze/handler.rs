// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Analyze endpoint handler

use axum::{extract::State, Json};
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::request::AnalyzeRequest;
use super::response::AnalyzeResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;

/// POST /api/analyze - Run one captured image through every configured model
///
/// # Request
/// - `image`: JPEG data URL or bare base64 (required)
///
/// # Response
/// - `results`: outcome per model id (`status` = `success` | `failure`)
/// - `detections`: boxes from every successful model, tagged with `model`
/// - `successCount`, `failureCount`, `processingTimeMs`, `requestId`
///
/// Upstream failures are reported per model; the call still returns 200.
///
/// # Errors
/// - 400 Bad Request: missing or undecodable image
/// - 500 Internal Server Error: target configuration is invalid
pub async fn analyze_handler(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let request_id = Uuid::new_v4().to_string();
    let image = request.payload()?;
    debug!(
        "[{}] Analyze request: {} {} bytes",
        request_id,
        image.mime_type(),
        image.size_bytes()
    );

    let start = Instant::now();
    let results = state.detection.analyze(&image).await?;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    info!(
        "[{}] Analysis complete: {} ok, {} failed, {}ms",
        request_id,
        results.success_count(),
        results.failure_count(),
        elapsed_ms
    );

    Ok(Json(AnalyzeResponse::new(request_id, results, elapsed_ms)))
}
