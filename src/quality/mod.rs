//! Frame quality scoring
//!
//! Classifies live frames by mean luminance to guide capture timing. The
//! brightness heuristic is an explicit stand-in for document-edge alignment
//! detection; thresholds live in configuration rather than code.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::camera::CameraSession;
use crate::config::QualityThresholds;
use crate::supervision::supervised;
use crate::types::{QualityLevel, RawFrame};

/// Scores frames by mean luminance against configurable thresholds
#[derive(Debug, Clone, Copy)]
pub struct FrameQualityScorer {
    thresholds: QualityThresholds,
}

impl FrameQualityScorer {
    pub fn new(thresholds: QualityThresholds) -> Self {
        Self { thresholds }
    }

    /// Mean luminance of an RGB24 frame using Rec. 601 weights
    pub fn mean_luminance(frame: &RawFrame) -> f32 {
        if frame.data.len() < 3 {
            return 0.0;
        }
        let mut sum = 0.0f64;
        let mut count = 0u64;
        for px in frame.data.chunks_exact(3) {
            let luma =
                0.299 * f64::from(px[0]) + 0.587 * f64::from(px[1]) + 0.114 * f64::from(px[2]);
            sum += luma;
            count += 1;
        }
        (sum / count as f64) as f32
    }

    /// Classify a luminance reading
    ///
    /// Below `poor_below` or above `poor_above` is poor; strictly inside the
    /// perfect band is perfect; everything else is good.
    pub fn classify(&self, luminance: f32) -> QualityLevel {
        let t = &self.thresholds;
        if luminance < t.poor_below || luminance > t.poor_above {
            QualityLevel::Poor
        } else if luminance > t.perfect_low && luminance < t.perfect_high {
            QualityLevel::Perfect
        } else {
            QualityLevel::Good
        }
    }

    pub fn score(&self, frame: &RawFrame) -> QualityLevel {
        self.classify(Self::mean_luminance(frame))
    }
}

impl Default for FrameQualityScorer {
    fn default() -> Self {
        Self::new(QualityThresholds::default())
    }
}

/// Timer-driven quality sampler
///
/// Polls the streaming session at a fixed interval and publishes the latest
/// classification on a watch channel. The task holds the camera only for the
/// duration of a grab; it exits on its own when the stream dies, and `stop`
/// must be called on every session exit so the timer never outlives the
/// capture flow.
#[derive(Debug)]
pub struct QualitySampler {
    handle: JoinHandle<()>,
    rx: watch::Receiver<QualityLevel>,
}

impl QualitySampler {
    pub fn start(
        session: Arc<Mutex<CameraSession>>,
        scorer: FrameQualityScorer,
        interval: Duration,
    ) -> Self {
        let (tx, rx) = watch::channel(QualityLevel::None);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;

                let session = session.clone();
                let sampled = tokio::task::spawn_blocking(move || {
                    let mut guard = session.lock().expect("lock poisoned");
                    if !guard.is_streaming() {
                        return None;
                    }
                    match guard.grab_frame() {
                        Ok(frame) => Some(supervised(
                            "frame scoring",
                            || QualityLevel::None,
                            move || scorer.score(&frame),
                        )),
                        Err(e) => {
                            log::warn!("Sampler grab failed, stopping: {}", e);
                            None
                        }
                    }
                })
                .await;

                match sampled {
                    Ok(Some(level)) => {
                        if tx.send(level).is_err() {
                            break;
                        }
                    }
                    _ => break,
                }
            }
            log::debug!("Quality sampler task exited");
        });

        Self { handle, rx }
    }

    /// Latest published classification
    pub fn latest(&self) -> QualityLevel {
        *self.rx.borrow()
    }

    /// Receiver for callers that want to await changes
    pub fn subscribe(&self) -> watch::Receiver<QualityLevel> {
        self.rx.clone()
    }

    /// Cancel the sampling task; mandatory on every session exit
    pub fn stop(self) {
        self.handle.abort();
    }
}
