//! End-to-end demo of the verification capture flow against the synthetic
//! providers: capture all three documents, normalize, bundle, and submit
//! through a scripted transport that drops the first attempt.

use std::sync::Arc;

use anyhow::Result;

use verishot::capture::CaptureController;
use verishot::config::VerishotConfig;
use verishot::handoff::{handoff_url, render_qr, HandoffRegistry};
use verishot::ocr::OcrExtractionAdapter;
use verishot::processing::ImagePostProcessor;
use verishot::testing::{MockCameraProvider, MockOcrProvider, ScriptedOutcome, ScriptedTransport};
use verishot::types::{DocumentKind, VerificationBundle};
use verishot::upload::UploadCoordinator;

#[tokio::main]
async fn main() -> Result<()> {
    verishot::init_logging();

    let config = VerishotConfig::load_or_default();
    config.validate().map_err(anyhow::Error::msg)?;

    // Pretend the backend issued us a booking and a handoff registry
    let booking_reference = "FLY-2026-084213";
    let registry = HandoffRegistry::new(config.handoff.ttl_secs);
    let token = registry.mint(booking_reference);
    let join_url = handoff_url(&config.handoff.origin, &token);
    let qr = render_qr(&join_url)?;
    println!(
        "Secondary device can join via {} (QR: {}x{})",
        join_url,
        qr.width(),
        qr.height()
    );

    let provider = MockCameraProvider::granted(120).with_dimensions(1600, 1200);
    let ocr = OcrExtractionAdapter::new(Arc::new(MockOcrProvider::replying(serde_json::json!({
        "number": "4242424242424242",
        "holder": "JANE DOE",
        "brand": "visa",
    }))));
    let processor = ImagePostProcessor::new(&config.processing);

    let mut bundle = VerificationBundle::new(booking_reference, token.token.clone());

    for kind in DocumentKind::ALL {
        let mut controller = CaptureController::open(
            &provider,
            kind,
            config.capture.clone(),
            config.quality,
        )?;

        // The live loop: quality is perfect under studio lighting, so
        // auto-capture fires on the first tick
        while !controller.tick().await? {
            tokio::time::sleep(std::time::Duration::from_millis(
                config.capture.sample_interval_ms,
            ))
            .await;
        }

        let extraction = controller.spawn_extraction(ocr.clone());
        extraction.await?;

        let record = controller.confirm()?;
        let raw = record.raw.clone().expect("confirmed capture has an image");
        let normalized = processor.normalize(&raw.bytes)?;

        println!(
            "{}: captured {}x{}, normalized {}x{} ({} bytes), fields: {:?}",
            kind,
            raw.width,
            raw.height,
            normalized.width,
            normalized.height,
            normalized.size_bytes(),
            record.extracted
        );

        bundle.attach(kind, raw, normalized, record.extracted);
        println!("Bundle progress: {}%", bundle.progress_percent());
    }

    assert!(bundle.can_submit());

    // First attempt times out, second lands
    let transport = Arc::new(ScriptedTransport::new(vec![
        ScriptedOutcome::Timeout,
        ScriptedOutcome::Accept,
    ]));
    let coordinator = UploadCoordinator::new(transport, config.upload.clone());

    let report = coordinator.submit(&bundle).await?;
    for attempt in &report.attempts {
        println!(
            "Attempt {}: {:?} ({})",
            attempt.number, attempt.outcome, attempt.reason
        );
    }
    println!(
        "Submission {} after {} attempt(s)",
        if report.succeeded() { "succeeded" } else { "failed" },
        report.attempt_count()
    );

    Ok(())
}
