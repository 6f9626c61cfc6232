// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Captured image payload shared by all submissions of one analysis

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Maximum decoded image size (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is empty")]
    Empty,

    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Malformed data URL: {0}")]
    MalformedDataUrl(String),
}

/// An encoded still image carried as base64 text
///
/// Cloning is cheap; every clone shares the same buffer.
#[derive(Clone)]
pub struct ImagePayload {
    data: Arc<str>,
    format: ImageFormat,
    size_bytes: usize,
}

impl ImagePayload {
    /// Build a payload from base64 text or a `data:image/...;base64,` URL
    pub fn from_base64(input: &str) -> Result<Self, ImageError> {
        let encoded = strip_data_url(input.trim())?;
        if encoded.is_empty() {
            return Err(ImageError::Empty);
        }

        let bytes = STANDARD.decode(encoded)?;
        let format = inspect(&bytes)?;

        Ok(Self {
            data: Arc::from(encoded),
            format,
            size_bytes: bytes.len(),
        })
    }

    /// Build a payload from raw encoded image bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageError> {
        let format = inspect(bytes)?;

        Ok(Self {
            data: Arc::from(STANDARD.encode(bytes)),
            format,
            size_bytes: bytes.len(),
        })
    }

    /// The base64 text sent upstream
    pub fn as_base64(&self) -> &str {
        &self.data
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Decoded size in bytes
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("format", &self.format)
            .field("size_bytes", &self.size_bytes)
            .finish()
    }
}

fn strip_data_url(input: &str) -> Result<&str, ImageError> {
    let Some(rest) = input.strip_prefix("data:") else {
        return Ok(input);
    };

    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::MalformedDataUrl("missing ',' separator".to_string()))?;

    if !header.starts_with("image/") {
        return Err(ImageError::MalformedDataUrl(format!(
            "expected an image media type, got '{}'",
            header
        )));
    }
    if !header.ends_with(";base64") {
        return Err(ImageError::MalformedDataUrl(
            "only base64 data URLs are supported".to_string(),
        ));
    }

    Ok(data)
}

fn inspect(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(ImageError::TooLarge(bytes.len(), MAX_IMAGE_SIZE));
    }
    image::guess_format(bytes).map_err(|_| ImageError::UnsupportedFormat)
}
