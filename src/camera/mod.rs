//! Camera capability interface and session lifecycle
//!
//! Camera hardware is an injected capability: hosts implement
//! [`CameraProvider`] for their platform (browser media stream, native
//! backend, or the synthetic provider in `testing`). The crate owns the
//! session state machine and guarantees the stream is released on every exit
//! path, including drop.

use crate::errors::VerifyError;
use crate::types::RawFrame;

/// Permission status as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PermissionStatus {
    /// Permission granted
    Granted,
    /// Permission denied at the platform level
    Denied,
    /// Permission not determined (user hasn't been asked, or platform has no
    /// permission query API)
    NotDetermined,
    /// Permission restricted by system policy
    Restricted,
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Granted => write!(f, "granted"),
            PermissionStatus::Denied => write!(f, "denied"),
            PermissionStatus::NotDetermined => write!(f, "not_determined"),
            PermissionStatus::Restricted => write!(f, "restricted"),
        }
    }
}

/// Detailed permission information with remediation copy
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PermissionInfo {
    pub status: PermissionStatus,
    pub message: String,
    /// Whether a retry affordance should be offered; false when the platform
    /// reports a permanent block
    pub can_retry: bool,
}

impl PermissionInfo {
    /// Platform-level block: the user must change a setting, retrying the
    /// prompt will not help
    pub fn blocked(status: PermissionStatus) -> Self {
        Self {
            status,
            message: "Camera access is blocked. Enable camera permission in your browser or system settings, then reload.".to_string(),
            can_retry: false,
        }
    }

    /// Prompt dismissed or permission state unknown: retrying can succeed
    pub fn declined() -> Self {
        Self {
            status: PermissionStatus::NotDetermined,
            message: "Camera permission was not granted. Tap Try Again and allow access when prompted.".to_string(),
            can_retry: true,
        }
    }
}

/// Which camera to request; documents want the environment-facing lens
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CameraFacing {
    Front,
    Rear,
}

/// A live media stream handle
///
/// `stop` must be idempotent; after it returns, `is_active` reports false and
/// `grab_frame` fails.
pub trait CameraStream: Send {
    fn grab_frame(&mut self) -> Result<RawFrame, VerifyError>;
    fn stop(&mut self);
    fn is_active(&self) -> bool;
}

/// Injected camera capability
pub trait CameraProvider: Send + Sync {
    /// Query the platform permission state without prompting
    fn permission_state(&self) -> PermissionStatus;

    /// Request hardware access, prompting if the platform requires it
    fn open(&self, facing: CameraFacing) -> Result<Box<dyn CameraStream>, VerifyError>;
}

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    RequestingPermission,
    Streaming,
    Denied,
    Released,
}

/// A scoped camera acquisition
///
/// Acquired on entering `Streaming`, guaranteed released on every exit path.
/// Dropping the session releases the stream.
pub struct CameraSession {
    state: SessionState,
    stream: Option<Box<dyn CameraStream>>,
    denial: Option<PermissionInfo>,
    facing: CameraFacing,
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("state", &self.state)
            .field("stream", &self.stream.as_ref().map(|_| "<dyn CameraStream>"))
            .field("denial", &self.denial)
            .field("facing", &self.facing)
            .finish()
    }
}

impl CameraSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Uninitialized,
            stream: None,
            denial: None,
            facing: CameraFacing::Rear,
        }
    }

    /// Request hardware access from the provider
    ///
    /// On denial the session distinguishes a permanent platform block from a
    /// dismissed prompt and records remediation info for the UI.
    pub fn acquire(
        &mut self,
        provider: &dyn CameraProvider,
        facing: CameraFacing,
    ) -> Result<(), VerifyError> {
        if self.state == SessionState::Streaming {
            return Ok(());
        }

        self.state = SessionState::RequestingPermission;
        self.facing = facing;

        match provider.open(facing) {
            Ok(stream) => {
                log::info!("Camera stream acquired ({:?})", facing);
                self.stream = Some(stream);
                self.denial = None;
                self.state = SessionState::Streaming;
                Ok(())
            }
            Err(e) => {
                let status = provider.permission_state();
                let info = match status {
                    PermissionStatus::Denied | PermissionStatus::Restricted => {
                        PermissionInfo::blocked(status)
                    }
                    _ => PermissionInfo::declined(),
                };
                log::warn!(
                    "Camera acquisition failed ({}): {}",
                    if info.can_retry { "transient" } else { "permanent" },
                    e
                );
                let permanent = !info.can_retry;
                let message = info.message.clone();
                self.denial = Some(info);
                self.stream = None;
                self.state = SessionState::Denied;
                Err(VerifyError::Permission { message, permanent })
            }
        }
    }

    /// Grab the current frame at native resolution
    ///
    /// A stream failure is fatal to the session: the hardware is released and
    /// the caller must re-acquire.
    pub fn grab_frame(&mut self) -> Result<RawFrame, VerifyError> {
        if self.state != SessionState::Streaming {
            return Err(VerifyError::Stream("session is not streaming".to_string()));
        }

        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| VerifyError::Stream("stream handle missing".to_string()))?;

        match stream.grab_frame() {
            Ok(frame) => Ok(frame),
            Err(e) => {
                log::error!("Stream failure, releasing camera: {}", e);
                self.release();
                Err(e)
            }
        }
    }

    /// Stop all media tracks; idempotent, runs on every exit path
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            log::debug!("Camera stream released");
        }
        if self.state != SessionState::Denied {
            self.state = SessionState::Released;
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_streaming(&self) -> bool {
        self.state == SessionState::Streaming
    }

    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    /// Remediation info recorded at the last denial
    pub fn denial(&self) -> Option<&PermissionInfo> {
        self.denial.as_ref()
    }
}

impl Default for CameraSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockCameraProvider;

    #[test]
    fn test_acquire_reaches_streaming() {
        let provider = MockCameraProvider::granted(128);
        let mut session = CameraSession::new();
        assert_eq!(session.state(), SessionState::Uninitialized);

        session.acquire(&provider, CameraFacing::Rear).unwrap();
        assert!(session.is_streaming());
        assert!(session.grab_frame().is_ok());
    }

    #[test]
    fn test_permanent_denial_has_no_retry() {
        let provider = MockCameraProvider::denied_permanently();
        let mut session = CameraSession::new();

        let err = session.acquire(&provider, CameraFacing::Rear).unwrap_err();
        assert!(matches!(err, VerifyError::Permission { permanent: true, .. }));
        assert_eq!(session.state(), SessionState::Denied);

        let info = session.denial().unwrap();
        assert!(!info.can_retry);
        assert!(info.message.contains("settings"));
    }

    #[test]
    fn test_transient_denial_offers_retry() {
        let provider = MockCameraProvider::declined();
        let mut session = CameraSession::new();

        let err = session.acquire(&provider, CameraFacing::Rear).unwrap_err();
        assert!(matches!(err, VerifyError::Permission { permanent: false, .. }));
        assert!(session.denial().unwrap().can_retry);
    }

    #[test]
    fn test_release_stops_stream() {
        let provider = MockCameraProvider::granted(128);
        let mut session = CameraSession::new();
        session.acquire(&provider, CameraFacing::Rear).unwrap();
        assert!(provider.stream_active());

        session.release();
        assert!(!provider.stream_active());
        assert_eq!(session.state(), SessionState::Released);

        // Idempotent
        session.release();
        assert!(!provider.stream_active());
    }

    #[test]
    fn test_drop_releases_stream() {
        let provider = MockCameraProvider::granted(128);
        {
            let mut session = CameraSession::new();
            session.acquire(&provider, CameraFacing::Rear).unwrap();
            assert!(provider.stream_active());
        }
        assert!(!provider.stream_active());
    }

    #[test]
    fn test_stream_failure_is_fatal_and_releases() {
        let provider = MockCameraProvider::granted(128);
        let mut session = CameraSession::new();
        session.acquire(&provider, CameraFacing::Rear).unwrap();

        provider.fail_next_frame();
        assert!(session.grab_frame().is_err());
        assert!(!session.is_streaming());
        assert!(!provider.stream_active());
    }
}
