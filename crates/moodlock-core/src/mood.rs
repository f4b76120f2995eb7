//! Mood inference stub.
//!
//! The emotion label is not derived from the image: it is a uniform pick
//! from [`Emotion::ALL`]. Only latency and confidence depend on face quality.

use crate::clock::{Clock, Delay, SystemClock, ThreadSleep};
use crate::frame::Frame;
use crate::lock::FaceLockManager;
use crate::types::{Emotion, FaceDetectionResult, FaceQuality, MoodDetectionResult};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

// --- Named constants ---
const CONFIDENCE_CAP: f32 = 0.98;
const LOCKED_JITTER: f32 = 0.08;
const LIVE_JITTER: f32 = 0.15;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoodError {
    #[error("no valid locked face available; lock a face first")]
    NoValidLock,
    #[error("no human face detected; position your face clearly in the camera view")]
    NoQualifyingFace,
    #[error("face quality too low; improve lighting and positioning")]
    LowQuality,
}

/// Simulated latency when inferring from a locked face.
pub fn locked_latency(quality: FaceQuality) -> Duration {
    Duration::from_millis(match quality {
        FaceQuality::Excellent => 1500,
        FaceQuality::Good => 2000,
        _ => 2500,
    })
}

/// Base confidence when inferring from a locked face.
pub fn locked_base_confidence(quality: FaceQuality) -> f32 {
    match quality {
        FaceQuality::Excellent => 0.90,
        FaceQuality::Good => 0.80,
        _ => 0.70,
    }
}

/// Simulated latency when inferring from a live detection.
pub fn live_latency(quality: FaceQuality) -> Duration {
    Duration::from_millis(match quality {
        FaceQuality::Excellent => 800,
        _ => 1200,
    })
}

/// Base confidence when inferring from a live detection.
pub fn live_base_confidence(quality: FaceQuality) -> f32 {
    match quality {
        FaceQuality::Excellent => 0.85,
        FaceQuality::Good => 0.75,
        _ => 0.65,
    }
}

/// Produces mood labels for locked or freshly detected faces.
pub struct MoodInference {
    clock: Arc<dyn Clock>,
    delay: Arc<dyn Delay>,
    rng: Box<dyn RngCore + Send>,
}

impl Default for MoodInference {
    fn default() -> Self {
        Self::new(
            Arc::new(SystemClock),
            Arc::new(ThreadSleep),
            Box::new(StdRng::from_entropy()),
        )
    }
}

impl MoodInference {
    pub fn new(
        clock: Arc<dyn Clock>,
        delay: Arc<dyn Delay>,
        rng: Box<dyn RngCore + Send>,
    ) -> Self {
        Self { clock, delay, rng }
    }

    /// Infer a mood from the current lock.
    pub fn from_locked_face(
        &mut self,
        locks: &mut FaceLockManager,
    ) -> Result<MoodDetectionResult, MoodError> {
        let start = self.clock.now();

        // Snapshot before the delay; the lock is not consulted again.
        let quality = locks.get().map(|l| l.quality).ok_or(MoodError::NoValidLock)?;

        self.delay.wait(locked_latency(quality));

        let emotion = self.pick_emotion();
        let confidence = self.jittered(locked_base_confidence(quality), LOCKED_JITTER);
        let processing_time = self.clock.now().saturating_duration_since(start);

        tracing::info!(
            %emotion,
            confidence,
            %quality,
            ?processing_time,
            "mood inferred from locked face"
        );

        Ok(MoodDetectionResult {
            success: true,
            emotion,
            confidence,
            used_locked_face: true,
            processing_time,
        })
    }

    /// Infer a mood from a live detection, preferring an existing lock.
    ///
    /// Attempts an implicit lock on `frame` as a side effect; failure to lock
    /// does not abort inference.
    pub fn from_live_detection(
        &mut self,
        locks: &mut FaceLockManager,
        frame: Option<&Frame>,
        detection: &FaceDetectionResult,
    ) -> Result<MoodDetectionResult, MoodError> {
        let start = self.clock.now();

        if locks.is_valid() {
            tracing::debug!("valid lock present; inferring from locked face");
            return self.from_locked_face(locks);
        }

        if !detection.face_detected || !detection.is_human {
            return Err(MoodError::NoQualifyingFace);
        }
        if detection.face_quality == FaceQuality::Poor {
            return Err(MoodError::LowQuality);
        }

        let used_locked_face = frame.map(|f| locks.lock(f, detection)).unwrap_or(false);

        let quality = detection.face_quality;
        self.delay.wait(live_latency(quality));

        let emotion = self.pick_emotion();
        let confidence = self.jittered(live_base_confidence(quality), LIVE_JITTER);
        let processing_time = self.clock.now().saturating_duration_since(start);

        tracing::info!(
            %emotion,
            confidence,
            %quality,
            used_locked_face,
            ?processing_time,
            "mood inferred from live detection"
        );

        Ok(MoodDetectionResult {
            success: true,
            emotion,
            confidence,
            used_locked_face,
            processing_time,
        })
    }

    fn pick_emotion(&mut self) -> Emotion {
        Emotion::ALL[self.rng.gen_range(0..Emotion::ALL.len())]
    }

    fn jittered(&mut self, base: f32, jitter: f32) -> f32 {
        (base + self.rng.gen::<f32>() * jitter).min(CONFIDENCE_CAP)
    }
}
