// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection service orchestration
//!
//! Binds an upstream client to the immutable list of configured targets.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::client::ModelClient;
use super::coordinator::{self, AnalysisError};
use super::image::ImagePayload;
use super::roboflow::RoboflowClient;
use super::types::{AnalysisResult, ModelTarget};

/// Shared entry point for analyses; cheap to clone
#[derive(Clone)]
pub struct DetectionService {
    client: Arc<dyn ModelClient>,
    targets: Arc<[ModelTarget]>,
}

impl DetectionService {
    /// Create a service from a client and a validated target list
    pub fn new(
        client: Arc<dyn ModelClient>,
        targets: Vec<ModelTarget>,
    ) -> Result<Self, AnalysisError> {
        coordinator::validate_targets(&targets)?;
        for target in &targets {
            debug!("Detection target enabled: {}", target.id);
        }
        Ok(Self {
            client,
            targets: targets.into(),
        })
    }

    /// Create a service backed by the hosted inference client
    pub fn hosted(
        targets: Vec<ModelTarget>,
        timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let client = RoboflowClient::new(timeout)?;
        Ok(Self::new(Arc::new(client), targets)?)
    }

    /// Analyze one image against every configured target
    pub async fn analyze(&self, image: &ImagePayload) -> Result<AnalysisResult, AnalysisError> {
        coordinator::analyze(self.client.as_ref(), image, &self.targets).await
    }

    pub fn targets(&self) -> &[ModelTarget] {
        &self.targets
    }

    pub fn target_ids(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.id.as_str()).collect()
    }
}
