// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Hosted inference API client
//!
//! Posts the base64 image as a form-encoded body to
//! `<endpoint>?api_key=<credential>` and reads back
//! `{predictions: [...], image: {width, height}}`.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

use super::client::{ModelClient, UpstreamError};
use super::image::ImagePayload;
use super::types::{DetectionBox, ImageDimensions, ModelOutcome, ModelTarget};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Longest upstream error body kept in a failure message
const MAX_ERROR_BODY: usize = 256;

/// Client for Roboflow-style hosted detection endpoints
#[derive(Debug, Clone)]
pub struct RoboflowClient {
    client: Client,
}

impl RoboflowClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `timeout` - Per-request timeout; `None` keeps the transport default (no timeout)
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Full request URL for a target, including the credential
    pub fn request_url(target: &ModelTarget) -> Result<Url, UpstreamError> {
        let endpoint = target.endpoint();
        let mut url = Url::parse(&endpoint).map_err(|e| UpstreamError::InvalidEndpoint {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut()
            .append_pair("api_key", &target.credential);
        Ok(url)
    }

    async fn try_submit(
        &self,
        target: &ModelTarget,
        image: &ImagePayload,
    ) -> Result<DetectionResponse, UpstreamError> {
        let url = Self::request_url(target)?;

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(image.as_base64().to_owned())
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate(&mut body, MAX_ERROR_BODY);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ModelClient for RoboflowClient {
    async fn submit(&self, target: &ModelTarget, image: &ImagePayload) -> ModelOutcome {
        debug!(
            "Submitting {} byte image to model {}",
            image.size_bytes(),
            target.id
        );
        let start = Instant::now();

        match self.try_submit(target, image).await {
            Ok(response) => {
                info!(
                    "Model {} returned {} detections in {}ms",
                    target.id,
                    response.predictions.len(),
                    start.elapsed().as_millis()
                );
                ModelOutcome::Success {
                    detections: response.predictions,
                    image: response.image,
                }
            }
            Err(e) => {
                warn!("Model {} failed: {}", target.id, e);
                e.into()
            }
        }
    }

    fn name(&self) -> &'static str {
        "roboflow"
    }
}

/// Expected success body; unknown fields (`time`, `inference_id`, ...) are ignored
#[derive(Debug, Deserialize)]
struct DetectionResponse {
    predictions: Vec<DetectionBox>,
    image: ImageDimensions,
}

fn truncate(text: &mut String, max: usize) {
    if text.len() > max {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
        text.push_str("...");
    }
}
