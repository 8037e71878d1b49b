use std::fmt;

/// Error taxonomy for the verification capture pipeline
///
/// Propagation policy: permission and processing errors surface immediately
/// with a retry affordance; network errors are retried transparently by the
/// upload coordinator before surfacing; OCR errors are swallowed at the
/// adapter boundary and never reach here; validation errors are resolved
/// entirely client-side.
#[derive(Debug)]
pub enum VerifyError {
    /// Camera access denied; `permanent` distinguishes a platform-level block
    /// from a dismissed prompt
    Permission { message: String, permanent: bool },
    /// Hardware or stream failure; fatal to the owning capture session
    Stream(String),
    /// Frame capture failed
    Capture(String),
    /// Decode, resize, or encode failure
    Processing(String),
    /// Transport-level failure after retries were exhausted
    Network(String),
    /// Server returned an error response; not retried
    Server(String),
    /// Field-level validation failure; never reaches the network
    Validation(String),
    /// Combined payload exceeds the pre-flight cap; no network call was made
    PayloadTooLarge { size_bytes: u64, limit_bytes: u64 },
}

impl VerifyError {
    /// The concrete recovery action to offer the user; the flow never leaves
    /// a failure state without one
    pub fn recovery_action(&self) -> &'static str {
        match self {
            VerifyError::Permission { permanent: true, .. } => "Open settings",
            VerifyError::Permission { permanent: false, .. } => "Try again",
            VerifyError::Stream(_) | VerifyError::Capture(_) => "Retake",
            VerifyError::Processing(_) => "Choose a different file",
            VerifyError::Network(_) | VerifyError::Server(_) => "Try again",
            VerifyError::Validation(_) => "Review the form",
            VerifyError::PayloadTooLarge { .. } => "Retake with smaller images",
        }
    }
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VerifyError::Permission { message, permanent } => {
                if *permanent {
                    write!(f, "Camera permission blocked: {}", message)
                } else {
                    write!(f, "Camera permission not granted: {}", message)
                }
            }
            VerifyError::Stream(msg) => write!(f, "Stream error: {}", msg),
            VerifyError::Capture(msg) => write!(f, "Capture error: {}", msg),
            VerifyError::Processing(msg) => write!(f, "Processing error: {}", msg),
            VerifyError::Network(msg) => write!(f, "Network error: {}", msg),
            VerifyError::Server(msg) => write!(f, "Server error: {}", msg),
            VerifyError::Validation(msg) => write!(f, "Validation error: {}", msg),
            VerifyError::PayloadTooLarge {
                size_bytes,
                limit_bytes,
            } => {
                write!(
                    f,
                    "Payload too large: {} bytes exceeds the {} byte limit",
                    size_bytes, limit_bytes
                )
            }
        }
    }
}

impl std::error::Error for VerifyError {}
