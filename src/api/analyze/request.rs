// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Analyze request types and validation

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::detection::ImagePayload;

/// Request body for POST /api/analyze
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Captured frame as a `data:image/jpeg;base64,...` URL or bare base64
    #[serde(default)]
    pub image: Option<String>,
}

impl AnalyzeRequest {
    /// Validate the request and decode its image
    pub fn payload(&self) -> Result<ImagePayload, ApiError> {
        let image = self
            .image
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ApiError::InvalidRequest("No image provided".to_string()))?;

        Ok(ImagePayload::from_base64(image)?)
    }
}
