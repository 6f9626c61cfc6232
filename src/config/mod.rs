// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for the detection relay
//!
//! Targets come from environment variables or from a TOML file:
//!
//! ```toml
//! bind_addr = "0.0.0.0:8080"
//! api_key = "shared-key"
//!
//! [[models]]
//! id = "waste-detection-cbffo-foffi/1"
//!
//! [[models]]
//! id = "trash-sorting/3"
//! api_key = "other-key"
//! endpoint_template = "https://detect.roboflow.com/{id}"
//! ```

use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::detection::coordinator::validate_targets;
use crate::detection::{ModelTarget, DEFAULT_ENDPOINT_TEMPLATE};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Request body limit; a 10MB image grows by a third once base64 encoded
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Address the HTTP API listens on
    pub bind_addr: String,
    /// Upstream detection models, in display order
    pub models: Vec<ModelTarget>,
    /// Per-request upstream timeout; `None` keeps the transport default
    pub upstream_timeout_secs: Option<u64>,
    /// Maximum accepted request body size
    pub max_body_bytes: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            models: Vec::new(),
            upstream_timeout_secs: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    bind_addr: Option<String>,
    api_key: Option<String>,
    endpoint_template: Option<String>,
    upstream_timeout_secs: Option<u64>,
    max_body_bytes: Option<usize>,
    #[serde(default)]
    models: Vec<FileModel>,
}

#[derive(Debug, Deserialize)]
struct FileModel {
    id: String,
    api_key: Option<String>,
    endpoint_template: Option<String>,
}

impl DetectionConfig {
    /// Load configuration from environment variables
    ///
    /// - `DETECTION_MODELS`: comma-separated model ids
    /// - `DETECTION_API_KEY`: credential shared by those models
    /// - `DETECTION_ENDPOINT_TEMPLATE`: endpoint pattern containing `{id}`
    /// - `API_HOST` / `API_PORT`: listen address
    /// - `UPSTREAM_TIMEOUT_SECS`: optional upstream timeout
    /// - `MAX_BODY_BYTES`: request body limit
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_key = lookup("DETECTION_API_KEY").unwrap_or_default();
        let template = lookup("DETECTION_ENDPOINT_TEMPLATE")
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT_TEMPLATE.to_string());

        let models = lookup("DETECTION_MODELS")
            .map(|ids| {
                ids.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(|id| ModelTarget::new(id, api_key.clone(), template.clone()))
                    .collect()
            })
            .unwrap_or_default();

        let bind_addr = match (lookup("API_HOST"), lookup("API_PORT")) {
            (None, None) => defaults.bind_addr,
            (host, port) => format!(
                "{}:{}",
                host.as_deref().unwrap_or("0.0.0.0"),
                port.as_deref().unwrap_or("8080")
            ),
        };

        Self {
            bind_addr,
            models,
            upstream_timeout_secs: lookup("UPSTREAM_TIMEOUT_SECS").and_then(|v| v.parse().ok()),
            max_body_bytes: lookup("MAX_BODY_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_body_bytes),
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(content)?;
        let defaults = Self::default();

        let shared_key = file.api_key.unwrap_or_default();
        let shared_template = file
            .endpoint_template
            .unwrap_or_else(|| DEFAULT_ENDPOINT_TEMPLATE.to_string());

        let models = file
            .models
            .into_iter()
            .map(|m| {
                ModelTarget::new(
                    m.id,
                    m.api_key.unwrap_or_else(|| shared_key.clone()),
                    m.endpoint_template
                        .unwrap_or_else(|| shared_template.clone()),
                )
            })
            .collect();

        Ok(Self {
            bind_addr: file.bind_addr.unwrap_or(defaults.bind_addr),
            models,
            upstream_timeout_secs: file.upstream_timeout_secs,
            max_body_bytes: file.max_body_bytes.unwrap_or(defaults.max_body_bytes),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        validate_targets(&self.models).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.upstream_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "Upstream timeout must be greater than 0".to_string(),
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "Body limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr.parse().map_err(|e| {
            ConfigError::Invalid(format!("Invalid bind address {}: {}", self.bind_addr, e))
        })
    }

    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout_secs.map(Duration::from_secs)
    }
}
