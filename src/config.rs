//! Configuration management for verishot
//!
//! Provides configuration loading, saving, and management for capture
//! behavior, quality thresholds, image normalization targets, and upload
//! limits.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::VerifyError;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerishotConfig {
    pub capture: CaptureConfig,
    pub quality: QualityThresholds,
    pub processing: ProcessingConfig,
    pub upload: UploadConfig,
    pub handoff: HandoffConfig,
}

/// Capture behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Fire capture automatically when quality reaches perfect
    pub auto_capture: bool,
    /// Quality sampling interval while streaming (ms)
    pub sample_interval_ms: u64,
    /// JPEG quality for direct camera captures (0-100)
    pub capture_jpeg_quality: u8,
    /// Linear contrast gain applied before encoding
    pub contrast: f32,
    /// Brightness bias applied before encoding (-255..255)
    pub brightness: i16,
}

/// Luminance thresholds for the frame quality heuristic
///
/// These are a stand-in for real document-edge detection; ranges were carried
/// over from the production defaults and are deliberately configurable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QualityThresholds {
    /// Mean luminance below this is too dark
    pub poor_below: f32,
    /// Mean luminance above this is too bright
    pub poor_above: f32,
    /// Lower bound (exclusive) of the perfect band
    pub perfect_low: f32,
    /// Upper bound (exclusive) of the perfect band
    pub perfect_high: f32,
}

/// Image normalization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Neither output dimension may exceed this (px)
    pub max_dimension: u32,
    /// JPEG quality for normalized output (0-100)
    pub jpeg_quality: u8,
}

/// Upload submission configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Verification endpoint URL
    pub endpoint: String,
    /// Hard payload cap checked before any network call (bytes)
    pub max_payload_bytes: u64,
    /// Per-attempt client timeout (ms)
    pub timeout_ms: u64,
    /// Fixed delay between retry attempts (ms)
    pub retry_delay_ms: u64,
    /// Total attempts per submission, including the first
    pub max_attempts: u32,
}

/// Cross-device handoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffConfig {
    /// Origin used when building handoff URLs
    pub origin: String,
    /// Token validity window (seconds)
    pub ttl_secs: u64,
}

impl Default for VerishotConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig {
                auto_capture: true,
                sample_interval_ms: 500,
                capture_jpeg_quality: 95,
                contrast: 1.1,
                brightness: 5,
            },
            quality: QualityThresholds::default(),
            processing: ProcessingConfig {
                max_dimension: 1200,
                jpeg_quality: 85,
            },
            upload: UploadConfig {
                endpoint: "https://api.example.com/verification/upload".to_string(),
                max_payload_bytes: 25 * 1024 * 1024,
                timeout_ms: 60_000,
                retry_delay_ms: 2_000,
                max_attempts: 3,
            },
            handoff: HandoffConfig {
                origin: "https://app.example.com".to_string(),
                ttl_secs: 900,
            },
        }
    }
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            poor_below: 30.0,
            poor_above: 230.0,
            perfect_low: 80.0,
            perfect_high: 180.0,
        }
    }
}

impl VerishotConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, VerifyError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            VerifyError::Validation(format!("Failed to read config file: {}", e))
        })?;

        let config: VerishotConfig = toml::from_str(&contents).map_err(|e| {
            VerifyError::Validation(format!("Failed to parse config file: {}", e))
        })?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), VerifyError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                VerifyError::Validation(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            VerifyError::Validation(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, toml_string).map_err(|e| {
            VerifyError::Validation(format!("Failed to write config file: {}", e))
        })?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("verishot.toml")
    }

    /// Load from default location or create with defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.capture.sample_interval_ms == 0 {
            return Err("Sample interval must be non-zero".to_string());
        }
        if self.capture.capture_jpeg_quality == 0 || self.capture.capture_jpeg_quality > 100 {
            return Err("Capture JPEG quality must be between 1 and 100".to_string());
        }
        if self.capture.contrast <= 0.0 || self.capture.contrast > 4.0 {
            return Err("Contrast gain must be between 0.0 and 4.0".to_string());
        }

        let q = &self.quality;
        if q.poor_below < 0.0 || q.poor_above > 255.0 {
            return Err("Luminance thresholds must be within 0-255".to_string());
        }
        if !(q.poor_below < q.perfect_low
            && q.perfect_low < q.perfect_high
            && q.perfect_high < q.poor_above)
        {
            return Err("Luminance thresholds must be strictly ordered".to_string());
        }

        if self.processing.max_dimension == 0 {
            return Err("Max dimension must be non-zero".to_string());
        }
        if self.processing.jpeg_quality == 0 || self.processing.jpeg_quality > 100 {
            return Err("JPEG quality must be between 1 and 100".to_string());
        }

        if self.upload.max_payload_bytes == 0 {
            return Err("Payload cap must be non-zero".to_string());
        }
        if self.upload.max_attempts == 0 || self.upload.max_attempts > 10 {
            return Err("Upload attempts must be between 1 and 10".to_string());
        }
        if self.upload.timeout_ms == 0 {
            return Err("Upload timeout must be non-zero".to_string());
        }

        if self.handoff.ttl_secs == 0 {
            return Err("Handoff TTL must be non-zero".to_string());
        }

        Ok(())
    }
}
