//! Quality classification contract tests against synthetic frames.

use verishot::config::QualityThresholds;
use verishot::quality::FrameQualityScorer;
use verishot::testing::{gradient_frame, synthetic_frame};
use verishot::types::QualityLevel;

#[test]
fn test_reference_luminance_vectors() {
    let scorer = FrameQualityScorer::default();
    assert_eq!(scorer.score(&synthetic_frame(10, 64, 48)), QualityLevel::Poor);
    assert_eq!(
        scorer.score(&synthetic_frame(120, 64, 48)),
        QualityLevel::Perfect
    );
    assert_eq!(scorer.score(&synthetic_frame(200, 64, 48)), QualityLevel::Good);
}

#[test]
fn test_overexposed_frame_is_poor() {
    let scorer = FrameQualityScorer::default();
    assert_eq!(scorer.score(&synthetic_frame(245, 64, 48)), QualityLevel::Poor);
}

#[test]
fn test_gradient_frame_averages_to_good_band() {
    // Mean of a 0..255 ramp sits near 127, inside the perfect band
    let scorer = FrameQualityScorer::default();
    assert_eq!(scorer.score(&gradient_frame(128, 32)), QualityLevel::Perfect);
}

#[test]
fn test_thresholds_are_data_not_code() {
    // A recalibrated band shifts the classification without touching the
    // scorer
    let strict = FrameQualityScorer::new(QualityThresholds {
        poor_below: 60.0,
        poor_above: 240.0,
        perfect_low: 110.0,
        perfect_high: 130.0,
    });
    assert_eq!(strict.score(&synthetic_frame(50, 32, 32)), QualityLevel::Poor);
    assert_eq!(strict.score(&synthetic_frame(100, 32, 32)), QualityLevel::Good);
    assert_eq!(
        strict.score(&synthetic_frame(120, 32, 32)),
        QualityLevel::Perfect
    );
}

#[test]
fn test_degenerate_frame_scores_without_panic() {
    let scorer = FrameQualityScorer::default();
    let empty = verishot::types::RawFrame::new(Vec::new(), 0, 0, "x".to_string());
    assert_eq!(scorer.score(&empty), QualityLevel::Poor);
}
