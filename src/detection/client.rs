// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upstream model client trait definition

use async_trait::async_trait;
use thiserror::Error;

use super::image::ImagePayload;
use super::types::{ModelOutcome, ModelTarget};

/// Errors from a single upstream submission
///
/// These never escape a [`ModelClient::submit`] call; they are rendered
/// into [`ModelOutcome::Failure`] messages.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The target's endpoint did not form a valid URL
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Network failure before a response was received
    #[error("transport error: {0}")]
    Transport(String),

    /// The upstream answered with a non-2xx status
    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the detection schema
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl From<UpstreamError> for ModelOutcome {
    fn from(err: UpstreamError) -> Self {
        ModelOutcome::failure(err.to_string())
    }
}

/// Submits one image to one detection endpoint
///
/// Implementations must capture every failure mode in the returned
/// outcome so that one failing target cannot abort its siblings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn submit(&self, target: &ModelTarget, image: &ImagePayload) -> ModelOutcome;

    /// Client name for logging
    fn name(&self) -> &'static str {
        "upstream"
    }
}
