// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fan-out of one image to every configured model

use std::collections::HashSet;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use super::client::ModelClient;
use super::image::{ImageError, ImagePayload};
use super::types::{AnalysisResult, ModelTarget};

/// The request was malformed; no submission was attempted
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid image: {0}")]
    Image(#[from] ImageError),

    #[error("Invalid target at index {index}: {reason}")]
    InvalidTarget { index: usize, reason: String },

    #[error("Duplicate target id: {id}")]
    DuplicateTarget { id: String },
}

/// Check a target list before any submission is issued
pub fn validate_targets(targets: &[ModelTarget]) -> Result<(), AnalysisError> {
    let mut seen = HashSet::with_capacity(targets.len());
    for (index, target) in targets.iter().enumerate() {
        target
            .validate()
            .map_err(|reason| AnalysisError::InvalidTarget { index, reason })?;
        if !seen.insert(target.id.as_str()) {
            return Err(AnalysisError::DuplicateTarget {
                id: target.id.clone(),
            });
        }
    }
    Ok(())
}

/// Submit `image` to every target concurrently and collect all outcomes
///
/// Waits for every submission to settle. Individual failures are recorded
/// as `Failure` entries and never fail the call; the result always holds
/// exactly one entry per target, in target order.
pub async fn analyze(
    client: &dyn ModelClient,
    image: &ImagePayload,
    targets: &[ModelTarget],
) -> Result<AnalysisResult, AnalysisError> {
    validate_targets(targets)?;

    if targets.is_empty() {
        debug!("No targets configured, returning empty analysis");
        return Ok(AnalysisResult::new());
    }

    let start = Instant::now();
    debug!(
        "Fanning out {} byte image to {} targets via {}",
        image.size_bytes(),
        targets.len(),
        client.name()
    );

    let submissions: Vec<_> = targets
        .iter()
        .map(|target| client.submit(target, image))
        .collect();
    let outcomes = futures::future::join_all(submissions).await;

    let mut result = AnalysisResult::with_capacity(targets.len());
    for (target, outcome) in targets.iter().zip(outcomes) {
        result.insert(target.id.clone(), outcome);
    }

    info!(
        "Analysis complete: {}/{} targets succeeded in {}ms",
        result.success_count(),
        result.len(),
        start.elapsed().as_millis()
    );

    Ok(result)
}
