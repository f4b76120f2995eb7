//! moodlock-core — Heuristic face presence detection, face lock and mood inference.
//!
//! Scores RGBA frames with six pixel heuristics (or a host-provided
//! detector), locks a snapshot of a qualifying face for a fixed TTL, and
//! produces a quality-weighted mood label from it.

pub mod clock;
pub mod detector;
pub mod frame;
pub mod lock;
pub mod metrics;
pub mod mood;
pub mod scorer;
pub mod session;
pub mod types;

pub use clock::{Clock, Delay, ManualClock, NoDelay, SystemClock, ThreadSleep};
pub use detector::{FaceDetector, NativeDetectionError, NativeFaceDetector};
pub use frame::{Frame, FrameError};
pub use lock::{FaceLockManager, LockedFaceData};
pub use mood::{MoodError, MoodInference};
pub use session::MoodSession;
pub use types::{
    DetectionMethod, Emotion, FaceDetectionResult, FaceQuality, MoodDetectionResult, Rect,
};
