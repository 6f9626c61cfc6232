// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod detection;
pub mod version;

pub use config::{ConfigError, DetectionConfig};
pub use detection::{
    AnalysisError, AnalysisResult, DetectionBox, DetectionService, ImagePayload, ModelClient,
    ModelOutcome, ModelTarget, RoboflowClient,
};
