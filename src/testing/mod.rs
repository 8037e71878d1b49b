//! Synthetic data and scripted capability providers for offline testing
//!
//! Enables reliable offline testing of the capture pipeline without camera
//! hardware, an OCR backend, or a verification server. Shipped as a public
//! module so integration suites and host applications can reuse it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::camera::{CameraFacing, CameraProvider, CameraStream, PermissionStatus};
use crate::errors::VerifyError;
use crate::ocr::{OcrError, OcrProvider};
use crate::types::{
    DocumentKind, EncodedImage, ImageEncoding, RawFrame, VerificationBundle,
};
use crate::upload::{ServerReply, TransportError, TransportResponse, UploadPayload, UploadTransport};

/// Uniform frame at the given luminance
///
/// With equal RGB channels the Rec. 601 weighted mean equals the channel
/// value, so tests can dial quality levels directly.
pub fn synthetic_frame(luminance: u8, width: u32, height: u32) -> RawFrame {
    let data = vec![luminance; (width * height * 3) as usize];
    RawFrame::new(data, width, height, "synthetic_camera".to_string())
}

/// Horizontal gradient frame, dark to bright
pub fn gradient_frame(width: u32, height: u32) -> RawFrame {
    let mut data = vec![0u8; (width * height * 3) as usize];
    for y in 0..height {
        for x in 0..width {
            let intensity = (x * 255 / width.max(1)) as u8;
            let idx = ((y * width + x) * 3) as usize;
            data[idx] = intensity;
            data[idx + 1] = intensity;
            data[idx + 2] = intensity;
        }
    }
    RawFrame::new(data, width, height, "synthetic_camera".to_string())
}

/// A complete three-document bundle with `bytes_per_image` of normalized
/// payload per record
pub fn complete_bundle(bytes_per_image: usize) -> VerificationBundle {
    let mut bundle = VerificationBundle::new("FLY-TEST-1234", "test-token");
    for kind in DocumentKind::ALL {
        let image = EncodedImage::new(
            vec![0xAB; bytes_per_image],
            ImageEncoding::Jpeg,
            640,
            480,
        );
        bundle.attach(kind, image.clone(), image, None);
    }
    bundle
}

/// Scripted camera capability for offline tests
///
/// Shares its stream state with the test so release behavior is observable:
/// `stream_active` reports whether the (single) stream's tracks are still
/// running.
pub struct MockCameraProvider {
    permission: PermissionStatus,
    allow_open: bool,
    luminance: Arc<AtomicU8>,
    active: Arc<AtomicBool>,
    fail_next: Arc<AtomicBool>,
    width: u32,
    height: u32,
}

impl MockCameraProvider {
    /// Permission granted; streams uniform frames at the given luminance
    pub fn granted(luminance: u8) -> Self {
        Self {
            permission: PermissionStatus::Granted,
            allow_open: true,
            luminance: Arc::new(AtomicU8::new(luminance)),
            active: Arc::new(AtomicBool::new(false)),
            fail_next: Arc::new(AtomicBool::new(false)),
            width: 320,
            height: 240,
        }
    }

    /// Platform reports a hard block; opening always fails
    pub fn denied_permanently() -> Self {
        Self {
            permission: PermissionStatus::Denied,
            allow_open: false,
            luminance: Arc::new(AtomicU8::new(0)),
            active: Arc::new(AtomicBool::new(false)),
            fail_next: Arc::new(AtomicBool::new(false)),
            width: 320,
            height: 240,
        }
    }

    /// Prompt dismissed; permission state still undetermined
    pub fn declined() -> Self {
        Self {
            permission: PermissionStatus::NotDetermined,
            allow_open: false,
            luminance: Arc::new(AtomicU8::new(0)),
            active: Arc::new(AtomicBool::new(false)),
            fail_next: Arc::new(AtomicBool::new(false)),
            width: 320,
            height: 240,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Change the streamed luminance, e.g. to walk quality levels mid-test
    pub fn set_luminance(&self, luminance: u8) {
        self.luminance.store(luminance, Ordering::Relaxed);
    }

    /// Make the next grab fail as a hardware/stream error
    pub fn fail_next_frame(&self) {
        self.fail_next.store(true, Ordering::Relaxed);
    }

    /// Whether the stream's tracks are still running
    pub fn stream_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}

impl CameraProvider for MockCameraProvider {
    fn permission_state(&self) -> PermissionStatus {
        self.permission
    }

    fn open(&self, _facing: CameraFacing) -> Result<Box<dyn CameraStream>, VerifyError> {
        if !self.allow_open {
            let permanent = matches!(
                self.permission,
                PermissionStatus::Denied | PermissionStatus::Restricted
            );
            return Err(VerifyError::Permission {
                message: "camera access was not granted".to_string(),
                permanent,
            });
        }

        self.active.store(true, Ordering::Relaxed);
        Ok(Box::new(MockStream {
            luminance: self.luminance.clone(),
            active: self.active.clone(),
            fail_next: self.fail_next.clone(),
            width: self.width,
            height: self.height,
        }))
    }
}

struct MockStream {
    luminance: Arc<AtomicU8>,
    active: Arc<AtomicBool>,
    fail_next: Arc<AtomicBool>,
    width: u32,
    height: u32,
}

impl CameraStream for MockStream {
    fn grab_frame(&mut self) -> Result<RawFrame, VerifyError> {
        if !self.active.load(Ordering::Relaxed) {
            return Err(VerifyError::Stream("stream is stopped".to_string()));
        }
        if self.fail_next.swap(false, Ordering::Relaxed) {
            return Err(VerifyError::Stream("simulated hardware failure".to_string()));
        }
        Ok(synthetic_frame(
            self.luminance.load(Ordering::Relaxed),
            self.width,
            self.height,
        ))
    }

    fn stop(&mut self) {
        self.active.store(false, Ordering::Relaxed);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}

/// Scripted OCR capability
pub struct MockOcrProvider {
    reply: Option<serde_json::Value>,
    failure: Option<String>,
    delay_ms: u64,
}

impl MockOcrProvider {
    /// Replies with the given raw JSON
    pub fn replying(value: serde_json::Value) -> Self {
        Self {
            reply: Some(value),
            failure: None,
            delay_ms: 0,
        }
    }

    /// Fails every extraction with a provider error
    pub fn failing(message: &str) -> Self {
        Self {
            reply: None,
            failure: Some(message.to_string()),
            delay_ms: 0,
        }
    }

    /// Replies after a delay, for exercising the non-blocking guarantee
    pub fn slow(value: serde_json::Value, delay_ms: u64) -> Self {
        Self {
            reply: Some(value),
            failure: None,
            delay_ms,
        }
    }
}

#[async_trait]
impl OcrProvider for MockOcrProvider {
    async fn extract(
        &self,
        _image: &[u8],
        _kind: DocumentKind,
    ) -> Result<serde_json::Value, OcrError> {
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        if let Some(message) = &self.failure {
            return Err(OcrError::Provider(message.clone()));
        }
        Ok(self
            .reply
            .clone()
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new())))
    }
}

/// One scripted transport outcome
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    Accept,
    Timeout,
    NetworkDown,
    Reject { status: u16, message: String },
}

/// Upload transport replaying a scripted outcome per call
///
/// Counts calls so tests can assert the pre-flight cap issues zero network
/// requests.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<ScriptedOutcome>>,
    calls: AtomicU32,
}

impl ScriptedTransport {
    pub fn new(outcomes: Vec<ScriptedOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            calls: AtomicU32::new(0),
        }
    }

    /// Number of submit calls observed
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl UploadTransport for ScriptedTransport {
    async fn submit(&self, _payload: &UploadPayload) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let outcome = self
            .script
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or(ScriptedOutcome::Accept);

        match outcome {
            ScriptedOutcome::Accept => Ok(TransportResponse {
                status: 200,
                reply: Some(ServerReply {
                    success: true,
                    error: None,
                }),
            }),
            ScriptedOutcome::Timeout => Err(TransportError::Timeout),
            ScriptedOutcome::NetworkDown => {
                Err(TransportError::Network("connection reset".to_string()))
            }
            ScriptedOutcome::Reject { status, message } => Ok(TransportResponse {
                status,
                reply: Some(ServerReply {
                    success: false,
                    error: Some(message),
                }),
            }),
        }
    }
}
