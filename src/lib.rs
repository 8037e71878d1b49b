//! verishot: document evidence capture and fraud-verification upload
//!
//! This crate implements the capture side of a booking fraud-verification
//! flow: live camera preview with near-real-time quality scoring, a
//! per-document capture state machine, image normalization, best-effort OCR
//! field extraction, and failure-tolerant submission of the completed
//! three-document bundle.
//!
//! # Capability injection
//! Camera hardware and OCR are injected at the boundary as the
//! [`camera::CameraProvider`] and [`ocr::OcrProvider`] traits, so the state
//! machines and upload logic stay independent of any vision or hardware
//! backend. The `testing` module ships synthetic implementations of both.
//!
//! # Usage
//! ```rust,no_run
//! use verishot::capture::CaptureController;
//! use verishot::config::VerishotConfig;
//! use verishot::testing::MockCameraProvider;
//! use verishot::types::DocumentKind;
//!
//! # async fn demo() -> Result<(), verishot::errors::VerifyError> {
//! let config = VerishotConfig::load_or_default();
//! let provider = MockCameraProvider::granted(120);
//!
//! let mut controller = CaptureController::open(
//!     &provider,
//!     DocumentKind::CardFront,
//!     config.capture.clone(),
//!     config.quality,
//! )?;
//! controller.capture().await?;
//! let record = controller.confirm()?;
//! # let _ = record;
//! # Ok(())
//! # }
//! ```
pub mod authorization;
pub mod camera;
pub mod capture;
pub mod config;
pub mod errors;
pub mod handoff;
pub mod ocr;
pub mod processing;
pub mod quality;
pub mod signature;
pub mod supervision;
pub mod types;
pub mod upload;

// Testing utilities - synthetic data and scripted providers for offline testing
pub mod testing;

// Re-exports for convenience
pub use errors::VerifyError;
pub use types::{
    DocumentKind, DocumentRecord, EncodedImage, QualityLevel, RawFrame, VerificationBundle,
};

/// Initialize logging for the verification pipeline
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "verishot=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_info() {
        let info = get_info();
        assert_eq!(info.name, "verishot");
        assert!(!info.version.is_empty());
        assert!(!info.description.is_empty());
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
    }
}
