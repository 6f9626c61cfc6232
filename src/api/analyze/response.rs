// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Analyze response types

use serde::Serialize;

use crate::detection::{AnalysisResult, MergedDetection};

/// Response body for POST /api/analyze
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub request_id: String,

    /// Outcome per model id, in configured order
    pub results: AnalysisResult,

    /// Detections of every successful model, tagged with the model id
    pub detections: Vec<MergedDetection>,

    pub success_count: usize,

    pub failure_count: usize,

    pub processing_time_ms: u64,
}

impl AnalyzeResponse {
    pub fn new(request_id: String, results: AnalysisResult, processing_time_ms: u64) -> Self {
        Self {
            detections: results.merged_detections(),
            success_count: results.success_count(),
            failure_count: results.failure_count(),
            request_id,
            results,
            processing_time_ms,
        }
    }
}
