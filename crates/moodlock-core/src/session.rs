//! Caller-owned aggregate of detector, face lock and mood inference.

use crate::clock::{Clock, Delay};
use crate::detector::FaceDetector;
use crate::frame::Frame;
use crate::lock::{FaceLockManager, LockedFaceData};
use crate::mood::{MoodError, MoodInference};
use crate::types::{FaceDetectionResult, MoodDetectionResult};
use rand::RngCore;
use std::sync::Arc;
use std::time::Duration;

/// One user's detection/lock/mood workflow.
///
/// Each session owns its own lock, so independent sessions never share state.
#[derive(Default)]
pub struct MoodSession {
    detector: FaceDetector,
    locks: FaceLockManager,
    mood: MoodInference,
}

impl MoodSession {
    pub fn new(detector: FaceDetector, locks: FaceLockManager, mood: MoodInference) -> Self {
        Self {
            detector,
            locks,
            mood,
        }
    }

    /// Build a session whose lock and inference share one clock and delay.
    pub fn with_time(
        detector: FaceDetector,
        clock: Arc<dyn Clock>,
        delay: Arc<dyn Delay>,
        rng: Box<dyn RngCore + Send>,
    ) -> Self {
        Self::new(
            detector,
            FaceLockManager::new(clock.clone()),
            MoodInference::new(clock, delay, rng),
        )
    }

    pub fn detect_face(&self, frame: Option<&Frame>) -> FaceDetectionResult {
        self.detector.detect(frame)
    }

    pub fn lock_face(&mut self, frame: &Frame, result: &FaceDetectionResult) -> bool {
        self.locks.lock(frame, result)
    }

    pub fn has_valid_lock(&mut self) -> bool {
        self.locks.is_valid()
    }

    pub fn locked_face(&mut self) -> Option<&LockedFaceData> {
        self.locks.get()
    }

    pub fn lock_remaining(&mut self) -> Option<Duration> {
        self.locks.remaining()
    }

    pub fn clear_lock(&mut self) {
        self.locks.clear();
    }

    pub fn detect_mood_from_locked_face(&mut self) -> Result<MoodDetectionResult, MoodError> {
        self.mood.from_locked_face(&mut self.locks)
    }

    pub fn detect_mood_from_video(
        &mut self,
        frame: Option<&Frame>,
        result: &FaceDetectionResult,
    ) -> Result<MoodDetectionResult, MoodError> {
        self.mood.from_live_detection(&mut self.locks, frame, result)
    }

    pub fn lock_manager(&mut self) -> &mut FaceLockManager {
        &mut self.locks
    }
}
