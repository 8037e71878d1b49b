//! Per-document capture orchestration
//!
//! Owns the capture state machine for a single document: live preview with
//! quality sampling, auto or manual trigger, deterministic enhancement and
//! encode, asynchronous OCR that never blocks confirmation, and guaranteed
//! release of the camera and sampler on every exit path.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::camera::{CameraFacing, CameraProvider, CameraSession};
use crate::config::{CaptureConfig, QualityThresholds};
use crate::errors::VerifyError;
use crate::ocr::OcrExtractionAdapter;
use crate::processing::encode_frame_jpeg;
use crate::quality::{FrameQualityScorer, QualitySampler};
use crate::types::{DocumentKind, DocumentRecord, EncodedImage, ExtractedFields, QualityLevel, RawFrame};

/// Capture flow states for one document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Streaming preview, waiting for a trigger
    Live,
    /// Frame grab and encode in flight
    Capturing,
    /// Captured; OCR extraction may still be running
    Processing,
    /// Ready for user review
    Reviewing,
    /// User accepted the capture; session is finished
    Confirmed,
    /// Hardware or stream failure; the session must be reopened
    Failed,
}

/// Mutable state of one document capture, snapshotted for the UI
#[derive(Debug, Clone)]
pub struct CaptureSession {
    pub kind: DocumentKind,
    pub state: CaptureState,
    pub quality: QualityLevel,
    pub captured: Option<EncodedImage>,
    pub extracted: Option<ExtractedFields>,
    pub last_error: Option<String>,
}

impl CaptureSession {
    fn new(kind: DocumentKind) -> Self {
        Self {
            kind,
            state: CaptureState::Live,
            quality: QualityLevel::None,
            captured: None,
            extracted: None,
            last_error: None,
        }
    }
}

/// Orchestrates the capture state machine for one document
///
/// At most one controller is active per verification flow, so there is no
/// contention over the camera.
#[derive(Debug)]
pub struct CaptureController {
    kind: DocumentKind,
    camera: Arc<Mutex<CameraSession>>,
    session: Arc<Mutex<CaptureSession>>,
    sampler: Option<QualitySampler>,
    config: CaptureConfig,
}

impl CaptureController {
    /// Acquire the camera and start quality sampling
    ///
    /// Must run inside a tokio runtime; the sampler is a timer task on the
    /// same loop.
    pub fn open(
        provider: &dyn CameraProvider,
        kind: DocumentKind,
        config: CaptureConfig,
        thresholds: QualityThresholds,
    ) -> Result<Self, VerifyError> {
        let mut camera = CameraSession::new();
        camera.acquire(provider, CameraFacing::Rear)?;
        let camera = Arc::new(Mutex::new(camera));

        let sampler = QualitySampler::start(
            camera.clone(),
            FrameQualityScorer::new(thresholds),
            Duration::from_millis(config.sample_interval_ms),
        );

        log::info!("Capture session opened for {}", kind);
        Ok(Self {
            kind,
            camera,
            session: Arc::new(Mutex::new(CaptureSession::new(kind))),
            sampler: Some(sampler),
            config,
        })
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn state(&self) -> CaptureState {
        self.session.lock().expect("lock poisoned").state
    }

    /// Snapshot of the session for rendering
    pub fn session(&self) -> CaptureSession {
        self.session.lock().expect("lock poisoned").clone()
    }

    /// Read the latest sampled quality and record it on the session
    pub fn poll_quality(&self) -> QualityLevel {
        let level = self
            .sampler
            .as_ref()
            .map(|s| s.latest())
            .unwrap_or(QualityLevel::None);
        self.session.lock().expect("lock poisoned").quality = level;
        level
    }

    /// Whether the auto-capture trigger should fire now
    pub fn should_auto_capture(&self) -> bool {
        self.config.auto_capture
            && self.state() == CaptureState::Live
            && self.poll_quality() == QualityLevel::Perfect
    }

    /// One turn of the live loop: sample quality, fire auto-capture if armed
    ///
    /// Returns true when a capture fired.
    pub async fn tick(&mut self) -> Result<bool, VerifyError> {
        if self.should_auto_capture() {
            self.capture().await?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Capture the current frame
    ///
    /// Grabs at native resolution, applies the deterministic
    /// contrast/brightness enhancement, and encodes at high quality. Stream
    /// failures are fatal to the session.
    pub async fn capture(&mut self) -> Result<(), VerifyError> {
        {
            let mut guard = self.session.lock().expect("lock poisoned");
            if guard.state != CaptureState::Live {
                return Err(VerifyError::Capture(format!(
                    "capture is only valid while live (state: {:?})",
                    guard.state
                )));
            }
            guard.state = CaptureState::Capturing;
        }

        let camera = self.camera.clone();
        let grabbed = tokio::task::spawn_blocking(move || {
            camera.lock().expect("lock poisoned").grab_frame()
        })
        .await
        .map_err(|e| VerifyError::Capture(format!("capture task join error: {}", e)))?;

        let frame = match grabbed {
            Ok(frame) => frame,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };

        let enhanced = enhance_frame(&frame, self.config.contrast, self.config.brightness);
        let encoded = match encode_frame_jpeg(&enhanced, self.config.capture_jpeg_quality) {
            Ok(encoded) => encoded,
            Err(e) => {
                let err = VerifyError::from(e);
                self.fail(&err);
                return Err(err);
            }
        };

        log::info!(
            "Captured {} frame: {}x{} ({} bytes)",
            self.kind,
            encoded.width,
            encoded.height,
            encoded.size_bytes()
        );

        let mut guard = self.session.lock().expect("lock poisoned");
        guard.captured = Some(encoded);
        guard.state = CaptureState::Processing;
        Ok(())
    }

    /// Kick off OCR on the captured image without blocking the flow
    ///
    /// The task publishes fields into the session when it finishes; if the
    /// user has already retaken or confirmed by then, the result is dropped.
    /// Extraction failures were absorbed by the adapter, so the task itself
    /// cannot fail.
    pub fn spawn_extraction(&self, adapter: OcrExtractionAdapter) -> JoinHandle<()> {
        let session = self.session.clone();
        let kind = self.kind;
        tokio::spawn(async move {
            let image = {
                let guard = session.lock().expect("lock poisoned");
                guard.captured.clone()
            };
            let Some(image) = image else {
                return;
            };

            let fields = adapter.extract(&image, kind).await;

            let mut guard = session.lock().expect("lock poisoned");
            match guard.state {
                CaptureState::Processing => {
                    guard.extracted = Some(fields);
                    guard.state = CaptureState::Reviewing;
                }
                CaptureState::Reviewing => {
                    guard.extracted = Some(fields);
                }
                _ => {
                    log::debug!("Dropping stale OCR result for {}", kind);
                }
            }
        })
    }

    /// Move to review without waiting for extraction
    pub fn finish_processing(&self) {
        let mut guard = self.session.lock().expect("lock poisoned");
        if guard.state == CaptureState::Processing {
            guard.state = CaptureState::Reviewing;
        }
    }

    /// Accept the capture and close the session
    ///
    /// Legal from `Processing` as well as `Reviewing`: a slow or failed OCR
    /// pass leaves the fields empty but never blocks the user.
    pub fn confirm(&mut self) -> Result<DocumentRecord, VerifyError> {
        let (captured, extracted) = {
            let mut guard = self.session.lock().expect("lock poisoned");
            match guard.state {
                CaptureState::Processing | CaptureState::Reviewing => {}
                other => {
                    return Err(VerifyError::Capture(format!(
                        "nothing to confirm (state: {:?})",
                        other
                    )))
                }
            }
            let captured = guard.captured.clone().ok_or_else(|| {
                VerifyError::Capture("no captured image to confirm".to_string())
            })?;
            let extracted = guard.extracted.clone();
            guard.state = CaptureState::Confirmed;
            (captured, extracted)
        };

        self.teardown();
        log::info!("Confirmed {} capture", self.kind);

        let mut record = DocumentRecord::new(self.kind);
        record.raw = Some(captured);
        record.extracted = extracted;
        Ok(record)
    }

    /// Discard the capture under review and return to live preview
    pub fn retake(&mut self) -> Result<(), VerifyError> {
        let mut guard = self.session.lock().expect("lock poisoned");
        if guard.state != CaptureState::Reviewing {
            return Err(VerifyError::Capture(format!(
                "retake is only valid while reviewing (state: {:?})",
                guard.state
            )));
        }
        guard.captured = None;
        guard.extracted = None;
        guard.state = CaptureState::Live;
        log::debug!("Retake: {} back to live", self.kind);
        Ok(())
    }

    /// Explicit user exit; releases the hardware
    pub fn cancel(&mut self) {
        log::info!("Capture session for {} cancelled", self.kind);
        self.teardown();
    }

    fn fail(&mut self, error: &VerifyError) {
        {
            let mut guard = self.session.lock().expect("lock poisoned");
            guard.last_error = Some(error.to_string());
            guard.state = CaptureState::Failed;
        }
        self.teardown();
    }

    /// Stop the sampler and release the camera; idempotent
    fn teardown(&mut self) {
        if let Some(sampler) = self.sampler.take() {
            sampler.stop();
        }
        self.camera.lock().expect("lock poisoned").release();
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Deterministic linear contrast/brightness enhancement
///
/// out = (px - 128) * contrast + 128 + brightness, clamped to 0..=255.
pub fn enhance_frame(frame: &RawFrame, contrast: f32, brightness: i16) -> RawFrame {
    let data = frame
        .data
        .iter()
        .map(|&px| {
            let adjusted =
                (f32::from(px) - 128.0) * contrast + 128.0 + f32::from(brightness);
            adjusted.clamp(0.0, 255.0) as u8
        })
        .collect();

    RawFrame::new(data, frame.width, frame.height, frame.device_id.clone())
}
