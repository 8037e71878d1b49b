//! Bundle submission with bounded retry
//!
//! Builds the multipart payload from a complete verification bundle, enforces
//! the hard size cap before any network call, and submits with a per-attempt
//! timeout. Transport-level failures (timeout, abort, connection loss) are
//! retried on a fixed delay; any server-returned error is terminal. Retries
//! are strictly sequential and the full attempt log is surfaced for UI
//! feedback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::config::UploadConfig;
use crate::errors::VerifyError;
use crate::types::{AttemptOutcome, DocumentKind, UploadAttempt, VerificationBundle};

/// Transport-level failure; always classified as retryable
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("request cancelled")]
    Cancelled,
    #[error("network failure: {0}")]
    Network(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

/// JSON body returned by the verification endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ServerReply {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// What the transport saw from the server
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub reply: Option<ServerReply>,
}

impl TransportResponse {
    /// The endpoint contract: 2xx plus `{"success": true}`
    pub fn accepted(&self) -> bool {
        (200..300).contains(&self.status)
            && self.reply.as_ref().map(|r| r.success).unwrap_or(false)
    }

    pub fn error_reason(&self) -> String {
        match &self.reply {
            Some(reply) => match &reply.error {
                Some(msg) => format!("server rejected upload (HTTP {}): {}", self.status, msg),
                None => format!("server rejected upload (HTTP {})", self.status),
            },
            None => format!("server returned HTTP {} with no parseable body", self.status),
        }
    }
}

/// The wire payload for one bundle submission
#[derive(Debug, Clone)]
pub struct UploadPayload {
    pub booking_reference: String,
    pub token: String,
    pub card_front: Bytes,
    pub card_back: Bytes,
    pub photo_id: Bytes,
}

impl UploadPayload {
    /// Assemble the payload from a complete bundle
    pub fn from_bundle(bundle: &VerificationBundle) -> Result<Self, VerifyError> {
        if !bundle.can_submit() {
            return Err(VerifyError::Validation(format!(
                "bundle is incomplete ({}%)",
                bundle.progress_percent()
            )));
        }

        let image = |kind: DocumentKind| -> Bytes {
            bundle
                .record(kind)
                .normalized
                .as_ref()
                .map(|img| img.bytes.clone())
                .unwrap_or_default()
        };

        Ok(Self {
            booking_reference: bundle.booking_reference.clone(),
            token: bundle.upload_token.clone(),
            card_front: image(DocumentKind::CardFront),
            card_back: image(DocumentKind::CardBack),
            photo_id: image(DocumentKind::PhotoId),
        })
    }

    /// Combined image size, checked against the cap before any network call
    pub fn total_bytes(&self) -> u64 {
        (self.card_front.len() + self.card_back.len() + self.photo_id.len()) as u64
    }
}

/// Transport seam so submission logic is testable without a server
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn submit(&self, payload: &UploadPayload) -> Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport with a hard per-attempt timeout
///
/// The client-level timeout cancels the in-flight request when it fires.
/// Multipart forms are consumed on send, so each attempt rebuilds the form
/// from the owned payload bytes.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, VerifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VerifyError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &UploadConfig) -> Result<Self, VerifyError> {
        Self::new(
            config.endpoint.clone(),
            Duration::from_millis(config.timeout_ms),
        )
    }

    fn build_form(payload: &UploadPayload) -> Result<Form, TransportError> {
        let part = |bytes: &Bytes, kind: DocumentKind| -> Result<Part, TransportError> {
            Ok(Part::stream(reqwest::Body::from(bytes.clone()))
                .file_name(format!("{}.jpg", kind.as_str()))
                .mime_str("image/jpeg")?)
        };

        Ok(Form::new()
            .text("bookingReference", payload.booking_reference.clone())
            .text("token", payload.token.clone())
            .part(
                DocumentKind::CardFront.field_name(),
                part(&payload.card_front, DocumentKind::CardFront)?,
            )
            .part(
                DocumentKind::CardBack.field_name(),
                part(&payload.card_back, DocumentKind::CardBack)?,
            )
            .part(
                DocumentKind::PhotoId.field_name(),
                part(&payload.photo_id, DocumentKind::PhotoId)?,
            ))
    }
}

#[async_trait]
impl UploadTransport for HttpTransport {
    async fn submit(&self, payload: &UploadPayload) -> Result<TransportResponse, TransportError> {
        let form = Self::build_form(payload)?;
        let resp = self.client.post(&self.endpoint).multipart(form).send().await?;

        let status = resp.status().as_u16();
        let reply = resp.json::<ServerReply>().await.ok();
        Ok(TransportResponse { status, reply })
    }
}

/// Result of a submission, including the per-attempt log
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub attempts: Vec<UploadAttempt>,
    /// Populated on failure, with a recovery action for the manual retry
    /// control
    pub failure: Option<String>,
}

impl UploadReport {
    pub fn succeeded(&self) -> bool {
        self.attempts
            .last()
            .map(|a| a.outcome == AttemptOutcome::Success)
            .unwrap_or(false)
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempts.len() as u32
    }
}

/// Submits complete bundles with bounded, strictly sequential retry
pub struct UploadCoordinator {
    transport: Arc<dyn UploadTransport>,
    config: UploadConfig,
}

impl UploadCoordinator {
    pub fn new(transport: Arc<dyn UploadTransport>, config: UploadConfig) -> Self {
        Self { transport, config }
    }

    /// Submit a bundle
    ///
    /// Errors before the first network call: incomplete bundle (validation)
    /// and payload over the hard cap. Everything after that is reported
    /// through the attempt log; submission is idempotent per
    /// bundle/token pair so a manual retry is always safe.
    pub async fn submit(&self, bundle: &VerificationBundle) -> Result<UploadReport, VerifyError> {
        let payload = UploadPayload::from_bundle(bundle)?;

        let size = payload.total_bytes();
        if size > self.config.max_payload_bytes {
            log::warn!(
                "Rejecting upload pre-flight: {} bytes over the {} byte cap",
                size,
                self.config.max_payload_bytes
            );
            return Err(VerifyError::PayloadTooLarge {
                size_bytes: size,
                limit_bytes: self.config.max_payload_bytes,
            });
        }

        let mut attempts: Vec<UploadAttempt> = Vec::new();
        let max_attempts = self.config.max_attempts.max(1);

        for number in 1..=max_attempts {
            if number > 1 {
                tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
            }

            log::info!(
                "Submitting bundle {} (attempt {}/{})",
                payload.booking_reference,
                number,
                max_attempts
            );

            match self.transport.submit(&payload).await {
                Ok(resp) if resp.accepted() => {
                    attempts.push(UploadAttempt {
                        number,
                        outcome: AttemptOutcome::Success,
                        reason: "accepted".to_string(),
                        at: chrono::Utc::now(),
                    });
                    log::info!(
                        "Bundle {} accepted on attempt {}",
                        payload.booking_reference,
                        number
                    );
                    return Ok(UploadReport {
                        attempts,
                        failure: None,
                    });
                }
                Ok(resp) => {
                    // Server spoke; its word is final, no retry
                    let reason = resp.error_reason();
                    log::error!("Terminal upload failure: {}", reason);
                    attempts.push(UploadAttempt {
                        number,
                        outcome: AttemptOutcome::TerminalFailure,
                        reason: reason.clone(),
                        at: chrono::Utc::now(),
                    });
                    return Ok(UploadReport {
                        attempts,
                        failure: Some(reason),
                    });
                }
                Err(e) => {
                    log::warn!(
                        "Retryable upload failure on attempt {}: {}",
                        number,
                        e
                    );
                    attempts.push(UploadAttempt {
                        number,
                        outcome: AttemptOutcome::RetryableFailure,
                        reason: e.to_string(),
                        at: chrono::Utc::now(),
                    });
                }
            }
        }

        let failure = format!(
            "upload failed after {} attempts; check your connection and try again",
            attempts.len()
        );
        log::error!("{}", failure);
        Ok(UploadReport {
            attempts,
            failure: Some(failure),
        })
    }
}
