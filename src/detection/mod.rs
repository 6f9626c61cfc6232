// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multi-model object detection
//!
//! Sends one captured image to every configured detection model, enabling:
//! - Concurrent submission to N hosted endpoints
//! - Per-model success/failure outcomes that never abort sibling calls
//! - A merged detection list across all successful models

pub mod client;
pub mod coordinator;
pub mod image;
pub mod roboflow;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use client::{ModelClient, UpstreamError};
pub use coordinator::{analyze, AnalysisError};
pub use image::{ImageError, ImagePayload};
pub use roboflow::RoboflowClient;
pub use service::DetectionService;
pub use types::{
    AnalysisResult, DetectionBox, ImageDimensions, MergedDetection, ModelOutcome, ModelTarget,
    DEFAULT_ENDPOINT_TEMPLATE,
};
