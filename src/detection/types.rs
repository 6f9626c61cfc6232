// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Core types for multi-model detection

use serde::de::{self, Deserializer, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder substituted with the target id in an endpoint template
pub const ID_PLACEHOLDER: &str = "{id}";

/// Hosted inference endpoint used when a target does not name its own
pub const DEFAULT_ENDPOINT_TEMPLATE: &str = "https://serverless.roboflow.com/{id}";

/// One configured upstream detection endpoint
#[derive(Clone, PartialEq)]
pub struct ModelTarget {
    /// Unique key, used in the result map and in the endpoint path
    pub id: String,
    /// Access token sent as the `api_key` query parameter
    pub credential: String,
    /// Base URL pattern containing `{id}`
    pub endpoint_template: String,
}

impl ModelTarget {
    pub fn new(
        id: impl Into<String>,
        credential: impl Into<String>,
        endpoint_template: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            credential: credential.into(),
            endpoint_template: endpoint_template.into(),
        }
    }

    /// Target on the default hosted endpoint
    pub fn hosted(id: impl Into<String>, credential: impl Into<String>) -> Self {
        Self::new(id, credential, DEFAULT_ENDPOINT_TEMPLATE)
    }

    /// Check that every field is present
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id must not be empty".to_string());
        }
        if self.credential.is_empty() {
            return Err(format!("credential for '{}' must not be empty", self.id));
        }
        if self.endpoint_template.trim().is_empty() {
            return Err(format!(
                "endpoint template for '{}' must not be empty",
                self.id
            ));
        }
        Ok(())
    }

    /// Endpoint URL with the id substituted, without the credential
    ///
    /// A template lacking `{id}` gets the id appended as a path segment.
    pub fn endpoint(&self) -> String {
        if self.endpoint_template.contains(ID_PLACEHOLDER) {
            self.endpoint_template.replace(ID_PLACEHOLDER, &self.id)
        } else {
            format!(
                "{}/{}",
                self.endpoint_template.trim_end_matches('/'),
                self.id
            )
        }
    }
}

impl fmt::Debug for ModelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelTarget")
            .field("id", &self.id)
            .field("credential", &"<redacted>")
            .field("endpoint_template", &self.endpoint_template)
            .finish()
    }
}

/// One detected object, box given by center point and extents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionBox {
    #[serde(rename = "class")]
    pub label: String,
    pub confidence: f64,
    /// Center x in source image pixels
    pub x: f64,
    /// Center y in source image pixels
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DetectionBox {
    /// Corner geometry `(left, top, right, bottom)` for renderers
    pub fn corners(&self) -> (f64, f64, f64, f64) {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        (
            self.x - half_w,
            self.y - half_h,
            self.x + half_w,
            self.y + half_h,
        )
    }
}

/// Source image dimensions as reported by the upstream service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    #[serde(deserialize_with = "lenient_u32")]
    pub width: u32,
    #[serde(deserialize_with = "lenient_u32")]
    pub height: u32,
}

// Hosted deployments variously report dimensions as integers, floats
// (`640.0`) or numeric strings.
fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    struct PixelCount;

    impl<'de> Visitor<'de> for PixelCount {
        type Value = u32;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative whole pixel count")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u32, E> {
            u32::try_from(v).map_err(|_| E::custom(format!("pixel count {} is out of range", v)))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u32, E> {
            u32::try_from(v).map_err(|_| E::custom(format!("pixel count {} is out of range", v)))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<u32, E> {
            if v.is_finite() && v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64 {
                Ok(v as u32)
            } else {
                Err(E::custom(format!("pixel count {} is not a whole number", v)))
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u32, E> {
            let text = v.trim();
            match text.parse::<u64>() {
                Ok(n) => self.visit_u64(n),
                Err(_) => match text.parse::<f64>() {
                    Ok(f) => self.visit_f64(f),
                    Err(_) => Err(E::custom(format!("pixel count '{}' is not a number", v))),
                },
            }
        }
    }

    deserializer.deserialize_any(PixelCount)
}

/// Settled result of one target's submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ModelOutcome {
    Success {
        #[serde(rename = "predictions")]
        detections: Vec<DetectionBox>,
        image: ImageDimensions,
    },
    Failure {
        #[serde(rename = "error")]
        message: String,
    },
}

impl ModelOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        ModelOutcome::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ModelOutcome::Success { .. })
    }

    /// Detections of a successful outcome, empty for a failure
    pub fn detections(&self) -> &[DetectionBox] {
        match self {
            ModelOutcome::Success { detections, .. } => detections,
            ModelOutcome::Failure { .. } => &[],
        }
    }

    pub fn failure_message(&self) -> Option<&str> {
        match self {
            ModelOutcome::Failure { message } => Some(message),
            ModelOutcome::Success { .. } => None,
        }
    }
}

/// A detection tagged with the model that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedDetection {
    pub model: String,
    #[serde(flatten)]
    pub detection: DetectionBox,
}

/// Per-target outcomes of one analysis, in target order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResult {
    entries: Vec<(String, ModelOutcome)>,
}

impl AnalysisResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert an outcome, replacing any existing entry for the same id
    pub fn insert(&mut self, id: impl Into<String>, outcome: ModelOutcome) {
        let id = id.into();
        match self.entries.iter_mut().find(|(key, _)| *key == id) {
            Some(entry) => entry.1 = outcome,
            None => self.entries.push((id, outcome)),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ModelOutcome> {
        self.entries
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, outcome)| outcome)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelOutcome)> {
        self.entries
            .iter()
            .map(|(id, outcome)| (id.as_str(), outcome))
    }

    pub fn success_count(&self) -> usize {
        self.entries.iter().filter(|(_, o)| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    /// Concatenate the detections of every successful target
    ///
    /// Failed targets contribute nothing. Boxes keep their upstream values.
    pub fn merged_detections(&self) -> Vec<MergedDetection> {
        self.entries
            .iter()
            .flat_map(|(id, outcome)| {
                outcome.detections().iter().map(move |d| MergedDetection {
                    model: id.clone(),
                    detection: d.clone(),
                })
            })
            .collect()
    }
}

impl Serialize for AnalysisResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, outcome) in &self.entries {
            map.serialize_entry(id, outcome)?;
        }
        map.end()
    }
}
