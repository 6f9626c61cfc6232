// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::http_server::AppState;
use crate::detection::ModelTarget;
use crate::version;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub models: usize,
    pub uptime_secs: u64,
}

/// Public view of a target; the credential is never exposed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub id: String,
    pub endpoint: String,
}

impl From<&ModelTarget> for ModelInfo {
    fn from(target: &ModelTarget) -> Self {
        Self {
            id: target.id.clone(),
            endpoint: target.endpoint(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: version::VERSION.to_string(),
        models: state.detection.targets().len(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// GET /api/models - Configured detection models
pub async fn models_handler(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state
            .detection
            .targets()
            .iter()
            .map(ModelInfo::from)
            .collect(),
    })
}
