//! Image normalization
//!
//! Decodes captured or user-selected images (any container `image` can read),
//! shrinks them so neither dimension exceeds the configured maximum, and
//! re-encodes to JPEG. Running the processor on its own output is a no-op
//! beyond re-encoding.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};

use crate::config::ProcessingConfig;
use crate::errors::VerifyError;
use crate::types::{EncodedImage, ImageEncoding, RawFrame};

/// Normalization failure; the caller should prompt the user to retry selection
#[derive(Debug, Clone)]
pub enum ProcessingError {
    /// Input could not be decoded
    Decode(String),
    /// Encoder failed
    Encode(String),
    /// Encoder produced no output
    EmptyOutput,
}

impl std::fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode(msg) => write!(f, "Unsupported or corrupt image: {}", msg),
            Self::Encode(msg) => write!(f, "Image encode failed: {}", msg),
            Self::EmptyOutput => write!(f, "Image encode produced no output"),
        }
    }
}

impl std::error::Error for ProcessingError {}

impl From<ProcessingError> for VerifyError {
    fn from(e: ProcessingError) -> Self {
        VerifyError::Processing(e.to_string())
    }
}

/// Normalizes raw captures and uploads into a standard compressed raster
#[derive(Debug, Clone)]
pub struct ImagePostProcessor {
    max_dimension: u32,
    jpeg_quality: u8,
}

impl ImagePostProcessor {
    pub fn new(config: &ProcessingConfig) -> Self {
        Self {
            max_dimension: config.max_dimension,
            jpeg_quality: config.jpeg_quality,
        }
    }

    /// Decode, shrink to fit the maximum dimension, and re-encode
    ///
    /// The resize is shrink-only: input already within bounds keeps its
    /// dimensions, which is what makes the operation idempotent.
    pub fn normalize(&self, input: &[u8]) -> Result<EncodedImage, ProcessingError> {
        let decoded =
            image::load_from_memory(input).map_err(|e| ProcessingError::Decode(e.to_string()))?;

        let (width, height) = decoded.dimensions();
        let longest = width.max(height);

        let resized = if longest > self.max_dimension {
            log::debug!(
                "Resizing {}x{} to fit {} px",
                width,
                height,
                self.max_dimension
            );
            decoded.resize(self.max_dimension, self.max_dimension, FilterType::Triangle)
        } else {
            decoded
        };

        let (out_width, out_height) = resized.dimensions();
        let bytes = encode_jpeg(&resized, self.jpeg_quality)?;

        Ok(EncodedImage::new(
            bytes,
            ImageEncoding::Jpeg,
            out_width,
            out_height,
        ))
    }
}

impl Default for ImagePostProcessor {
    fn default() -> Self {
        Self::new(&ProcessingConfig {
            max_dimension: 1200,
            jpeg_quality: 85,
        })
    }
}

/// Encode a decoded image to JPEG at the given quality
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ProcessingError> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buffer), quality);
    image
        .to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| ProcessingError::Encode(e.to_string()))?;

    if buffer.is_empty() {
        return Err(ProcessingError::EmptyOutput);
    }
    Ok(buffer)
}

/// Encode a raw RGB frame to JPEG at the given quality
pub fn encode_frame_jpeg(frame: &RawFrame, quality: u8) -> Result<EncodedImage, ProcessingError> {
    let rgb = RgbImage::from_raw(frame.width, frame.height, frame.data.clone()).ok_or_else(
        || {
            ProcessingError::Encode(format!(
                "frame buffer size {} does not match {}x{}",
                frame.data.len(),
                frame.width,
                frame.height
            ))
        },
    )?;

    let bytes = encode_jpeg(&DynamicImage::ImageRgb8(rgb), quality)?;
    Ok(EncodedImage::new(
        bytes,
        ImageEncoding::Jpeg,
        frame.width,
        frame.height,
    ))
}
