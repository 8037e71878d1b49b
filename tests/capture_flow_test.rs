//! Capture state machine and resource lifecycle tests
//!
//! Drives the per-document capture flow against the synthetic camera:
//! auto and manual triggers, the non-blocking OCR guarantee, retake
//! semantics, and the release-on-every-exit-path invariant.

use std::sync::Arc;
use std::time::Duration;

use verishot::capture::{CaptureController, CaptureState};
use verishot::config::{CaptureConfig, QualityThresholds};
use verishot::errors::VerifyError;
use verishot::ocr::OcrExtractionAdapter;
use verishot::testing::{MockCameraProvider, MockOcrProvider};
use verishot::types::{DocumentKind, ExtractedFields, QualityLevel};

fn config(auto_capture: bool) -> CaptureConfig {
    CaptureConfig {
        auto_capture,
        sample_interval_ms: 10,
        capture_jpeg_quality: 90,
        contrast: 1.0,
        brightness: 0,
    }
}

fn open(provider: &MockCameraProvider, auto_capture: bool) -> CaptureController {
    CaptureController::open(
        provider,
        DocumentKind::CardFront,
        config(auto_capture),
        QualityThresholds::default(),
    )
    .expect("camera acquisition")
}

/// Run live ticks until a capture fires or the tick allowance runs out
async fn drive_until_captured(controller: &mut CaptureController, ticks: u32) -> bool {
    for _ in 0..ticks {
        tokio::time::sleep(Duration::from_millis(15)).await;
        if controller.tick().await.expect("tick") {
            return true;
        }
    }
    false
}

#[tokio::test]
async fn test_auto_capture_fires_on_perfect_quality() {
    let provider = MockCameraProvider::granted(120); // perfect band
    let mut controller = open(&provider, true);
    assert_eq!(controller.state(), CaptureState::Live);

    assert!(drive_until_captured(&mut controller, 50).await);
    assert_eq!(controller.state(), CaptureState::Processing);
    assert!(controller.session().captured.is_some());
}

#[tokio::test]
async fn test_auto_capture_holds_below_perfect() {
    let provider = MockCameraProvider::granted(200); // good, not perfect
    let mut controller = open(&provider, true);

    assert!(!drive_until_captured(&mut controller, 20).await);
    assert_eq!(controller.state(), CaptureState::Live);
    assert_eq!(controller.poll_quality(), QualityLevel::Good);

    // Manual trigger still works
    controller.capture().await.expect("manual capture");
    assert_eq!(controller.state(), CaptureState::Processing);
}

#[tokio::test]
async fn test_manual_capture_when_auto_disabled() {
    let provider = MockCameraProvider::granted(120);
    let mut controller = open(&provider, false);

    assert!(!drive_until_captured(&mut controller, 10).await);
    controller.capture().await.expect("manual capture");
    assert_eq!(controller.state(), CaptureState::Processing);
}

#[tokio::test]
async fn test_capture_is_rejected_outside_live() {
    let provider = MockCameraProvider::granted(120);
    let mut controller = open(&provider, false);

    controller.capture().await.unwrap();
    let err = controller.capture().await.unwrap_err();
    assert!(matches!(err, VerifyError::Capture(_)));
}

#[tokio::test]
async fn test_ocr_completion_moves_to_reviewing() {
    let provider = MockCameraProvider::granted(120);
    let mut controller = open(&provider, false);
    controller.capture().await.unwrap();

    let adapter = OcrExtractionAdapter::new(Arc::new(MockOcrProvider::replying(
        serde_json::json!({"number": "4242424242424242"}),
    )));
    controller.spawn_extraction(adapter).await.unwrap();

    assert_eq!(controller.state(), CaptureState::Reviewing);
    match controller.session().extracted {
        Some(ExtractedFields::Card(card)) => {
            assert_eq!(card.number.as_deref(), Some("4242424242424242"));
        }
        other => panic!("expected card fields, got {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_ocr_never_blocks_confirmation() {
    let provider = MockCameraProvider::granted(120);
    let mut controller = open(&provider, false);
    controller.capture().await.unwrap();

    // OCR will take far longer than the user
    let adapter = OcrExtractionAdapter::new(Arc::new(MockOcrProvider::slow(
        serde_json::json!({"number": "4242424242424242"}),
        5_000,
    )));
    let task = controller.spawn_extraction(adapter);

    // Confirm straight from Processing: fields stay empty
    let record = controller.confirm().expect("confirm without waiting on OCR");
    assert!(record.extracted.is_none());
    assert!(record.raw.is_some());

    task.abort();
}

#[tokio::test]
async fn test_failed_ocr_is_swallowed() {
    let provider = MockCameraProvider::granted(120);
    let mut controller = open(&provider, false);
    controller.capture().await.unwrap();

    let adapter =
        OcrExtractionAdapter::new(Arc::new(MockOcrProvider::failing("vision service down")));
    controller.spawn_extraction(adapter).await.unwrap();

    // Failure leaves an empty record and the document is still confirmable
    assert_eq!(controller.state(), CaptureState::Reviewing);
    let session = controller.session();
    assert!(session.extracted.as_ref().map(|f| f.is_empty()).unwrap_or(false));

    let record = controller.confirm().unwrap();
    assert!(record.raw.is_some());
}

#[tokio::test]
async fn test_retake_clears_capture_and_returns_live() {
    let provider = MockCameraProvider::granted(120);
    let mut controller = open(&provider, false);
    controller.capture().await.unwrap();
    controller.finish_processing();
    assert_eq!(controller.state(), CaptureState::Reviewing);

    controller.retake().expect("retake from reviewing");
    let session = controller.session();
    assert_eq!(session.state, CaptureState::Live);
    assert!(session.captured.is_none());
    assert!(session.extracted.is_none());

    // A fresh capture works after retake
    controller.capture().await.expect("capture after retake");
}

#[tokio::test]
async fn test_retake_is_rejected_while_live() {
    let provider = MockCameraProvider::granted(120);
    let mut controller = open(&provider, false);
    assert!(controller.retake().is_err());
}

#[tokio::test]
async fn test_confirm_releases_camera() {
    let provider = MockCameraProvider::granted(120);
    let mut controller = open(&provider, false);
    assert!(provider.stream_active());

    controller.capture().await.unwrap();
    controller.finish_processing();
    let record = controller.confirm().unwrap();

    assert_eq!(record.kind, DocumentKind::CardFront);
    assert!(!provider.stream_active(), "confirm must stop the stream");
}

#[tokio::test]
async fn test_cancel_releases_camera() {
    let provider = MockCameraProvider::granted(120);
    let mut controller = open(&provider, false);
    assert!(provider.stream_active());

    controller.cancel();
    assert!(!provider.stream_active(), "cancel must stop the stream");
}

#[tokio::test]
async fn test_stream_error_is_fatal_and_releases_camera() {
    let provider = MockCameraProvider::granted(120);
    let mut controller = open(&provider, false);

    provider.fail_next_frame();
    let err = controller.capture().await.unwrap_err();
    assert!(matches!(err, VerifyError::Stream(_)));

    assert_eq!(controller.state(), CaptureState::Failed);
    assert!(!provider.stream_active(), "stream error must stop the stream");
    assert!(controller.session().last_error.is_some());
}

#[tokio::test]
async fn test_drop_releases_camera() {
    let provider = MockCameraProvider::granted(120);
    {
        let _controller = open(&provider, false);
        assert!(provider.stream_active());
    }
    assert!(!provider.stream_active(), "drop must stop the stream");
}

#[tokio::test]
async fn test_denied_provider_never_opens() {
    let provider = MockCameraProvider::denied_permanently();
    let err = CaptureController::open(
        &provider,
        DocumentKind::PhotoId,
        config(true),
        QualityThresholds::default(),
    )
    .unwrap_err();

    assert!(matches!(err, VerifyError::Permission { permanent: true, .. }));
    assert!(!provider.stream_active());
}
