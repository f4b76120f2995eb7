//! Face lock: a single frozen snapshot of a detected face with a fixed TTL.
//!
//! Expiry is lazy. Every access re-checks the TTL against the injected
//! clock and drops an expired lock on the spot.

use crate::clock::{Clock, SystemClock};
use crate::frame::{Frame, FrameError};
use crate::types::{FaceDetectionResult, FaceQuality, Rect};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

// --- Named constants ---
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(30);
pub const DEFAULT_LOCK_PADDING: u32 = 20;
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

#[derive(Error, Debug)]
pub enum LockError {
    #[error("detection result is not a lockable human face")]
    PreconditionFailed,
    #[error("snapshot failed: {0}")]
    Snapshot(#[from] FrameError),
}

/// The locked face snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct LockedFaceData {
    pub id: Uuid,
    /// JPEG snapshot of the padded face region.
    #[serde(skip)]
    pub image_data: Vec<u8>,
    /// Face region at lock time, without padding.
    pub bounding_box: Rect,
    pub quality: FaceQuality,
    pub confidence: f32,
    /// Creation instant on the manager's clock; drives expiry.
    #[serde(skip)]
    pub timestamp: Instant,
    /// Wall-clock creation time, for display.
    pub locked_at: DateTime<Utc>,
}

impl LockedFaceData {
    /// Snapshot rendered as a `data:image/jpeg;base64,...` URL.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.image_data)
        )
    }
}

/// Owns at most one locked face.
pub struct FaceLockManager {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    padding: u32,
    jpeg_quality: u8,
    locked: Option<LockedFaceData>,
}

impl Default for FaceLockManager {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl FaceLockManager {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            ttl: DEFAULT_LOCK_TTL,
            padding: DEFAULT_LOCK_PADDING,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            locked: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Lock onto the face in `result`, replacing any existing lock.
    ///
    /// Returns `false` and leaves state untouched if the result is not a
    /// detected human face with a region, or if the snapshot fails.
    pub fn lock(&mut self, frame: &Frame, result: &FaceDetectionResult) -> bool {
        match self.try_lock(frame, result) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "face lock refused");
                false
            }
        }
    }

    fn try_lock(&mut self, frame: &Frame, result: &FaceDetectionResult) -> Result<(), LockError> {
        let region = match result.face_region {
            Some(r) if result.is_human && result.face_detected => r,
            _ => return Err(LockError::PreconditionFailed),
        };

        let image_data = frame.encode_jpeg(&region.padded(self.padding as f32), self.jpeg_quality)?;

        let locked = LockedFaceData {
            id: Uuid::new_v4(),
            image_data,
            bounding_box: region,
            quality: result.face_quality,
            confidence: result.confidence,
            timestamp: self.clock.now(),
            locked_at: Utc::now(),
        };

        tracing::info!(
            id = %locked.id,
            quality = %locked.quality,
            confidence = locked.confidence,
            bytes = locked.image_data.len(),
            "face locked"
        );
        if let Some(prev) = self.locked.replace(locked) {
            tracing::debug!(id = %prev.id, "previous face lock replaced");
        }
        Ok(())
    }

    /// True iff a lock exists and is younger than the TTL. Clears an expired lock.
    pub fn is_valid(&mut self) -> bool {
        let Some(locked) = &self.locked else {
            return false;
        };
        let age = self.clock.now().saturating_duration_since(locked.timestamp);
        if age < self.ttl {
            return true;
        }
        tracing::info!(id = %locked.id, age_ms = age.as_millis() as u64, "face lock expired");
        self.locked = None;
        false
    }

    /// The current lock, if still valid.
    pub fn get(&mut self) -> Option<&LockedFaceData> {
        if self.is_valid() {
            self.locked.as_ref()
        } else {
            None
        }
    }

    /// Time left before the current lock expires.
    pub fn remaining(&mut self) -> Option<Duration> {
        let now = self.clock.now();
        let ttl = self.ttl;
        self.get()
            .map(|l| ttl.saturating_sub(now.saturating_duration_since(l.timestamp)))
    }

    /// Drop the lock unconditionally.
    pub fn clear(&mut self) {
        if let Some(prev) = self.locked.take() {
            tracing::info!(id = %prev.id, "face lock cleared");
        }
    }
}
