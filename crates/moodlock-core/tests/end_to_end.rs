use moodlock_core::metrics::FaceMetrics;
use moodlock_core::scorer;
use moodlock_core::{
    DetectionMethod, FaceDetector, FaceQuality, Frame, ManualClock, MoodError, MoodSession,
    NativeDetectionError, NativeFaceDetector, Rect,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;

const SKIN: [u8; 3] = [200, 150, 120];
const DARK: [u8; 3] = [30, 20, 15];

/// 400x400 mirror-symmetric synthetic face: skin everywhere, with a band of
/// dark columns (2 of every 5, measured from the nearer edge) over rows 92..200
/// so every sweep region sees a partly dark eye band.
fn synthetic_face() -> Frame {
    let (w, h) = (400u32, 400u32);
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            let d = x.min(w - 1 - x);
            let dark = (92..200).contains(&y) && d % 5 < 2;
            let [r, g, b] = if dark { DARK } else { SKIN };
            data.extend_from_slice(&[r, g, b, 255]);
        }
    }
    Frame::from_rgba(data, w, h).unwrap()
}

fn session(clock: &ManualClock, detector: FaceDetector) -> MoodSession {
    MoodSession::with_time(
        detector,
        Arc::new(clock.clone()),
        Arc::new(clock.clone()),
        Box::new(StdRng::seed_from_u64(42)),
    )
}

#[test]
fn synthetic_face_metrics_are_strong() {
    let frame = synthetic_face();
    let (pixels, w, h) = frame.region(&Rect::new(100.0, 60.0, 200.0, 280.0)).unwrap();
    let m = FaceMetrics::measure(&pixels, w, h);

    assert!(m.skin_tone > 0.8, "skin {}", m.skin_tone);
    assert!((m.symmetry - 1.0).abs() < 1e-6);
    assert!(m.proportions > 0.95);
    assert!((m.eye_region - 0.8).abs() < 1e-3, "eye {}", m.eye_region);
    assert!((m.contrast - 0.9).abs() < 1e-3, "contrast {}", m.contrast);
    assert_eq!(m.lighting, 1.0);

    let score = scorer::score_metrics(m);
    assert!(score.human_score > 0.88 && score.human_score < 0.95);
    assert!(score.is_human);
    assert_eq!(score.quality, FaceQuality::Excellent);
}

#[test]
fn synthetic_face_locks_and_infers_mood() {
    let clock = ManualClock::new();
    let mut session = session(&clock, FaceDetector::heuristic());
    let frame = synthetic_face();

    let result = session.detect_face(Some(&frame));
    assert_eq!(result.detection_method, DetectionMethod::Heuristic);
    assert!(result.is_human);
    assert!(result.face_detected);
    assert_eq!(result.face_count, 1);
    assert_eq!(result.face_quality, FaceQuality::Excellent);
    assert!(result.confidence <= 0.95);
    assert_eq!(result.face_region, Some(Rect::new(100.0, 60.0, 200.0, 280.0)));

    assert!(session.lock_face(&frame, &result));
    let locked = session.locked_face().unwrap();
    assert_eq!(locked.quality, FaceQuality::Excellent);
    let decoded = image::load_from_memory(&locked.image_data).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (240, 320));

    let mood = session.detect_mood_from_locked_face().unwrap();
    assert!(mood.used_locked_face);
    assert!(mood.processing_time >= Duration::from_millis(1500));
    assert!(mood.processing_time < Duration::from_millis(1700));
    assert!(mood.confidence >= 0.90 && mood.confidence <= 0.98);
}

#[test]
fn mid_gray_frame_is_rejected() {
    let clock = ManualClock::new();
    let mut session = session(&clock, FaceDetector::heuristic());
    let frame = Frame::solid(400, 400, [128, 128, 128]).unwrap();

    let result = session.detect_face(Some(&frame));
    assert!(!result.is_human);
    assert!(!result.face_detected);
    assert!(!session.lock_face(&frame, &result));
    assert!(!session.has_valid_lock());

    assert_eq!(
        session.detect_mood_from_video(Some(&frame), &result),
        Err(MoodError::NoQualifyingFace)
    );
    assert_eq!(session.detect_mood_from_locked_face(), Err(MoodError::NoValidLock));
}

#[test]
fn live_mood_locks_then_reuses_lock_until_expiry() {
    let clock = ManualClock::new();
    let mut session = session(&clock, FaceDetector::heuristic());
    let frame = synthetic_face();
    let result = session.detect_face(Some(&frame));

    let first = session.detect_mood_from_video(Some(&frame), &result).unwrap();
    assert!(first.used_locked_face);
    assert_eq!(first.processing_time, Duration::from_millis(800));
    assert!(session.has_valid_lock());

    // The lock now takes precedence: locked-face latency applies.
    let second = session.detect_mood_from_video(Some(&frame), &result).unwrap();
    assert_eq!(second.processing_time, Duration::from_millis(1500));

    // 800 + 1500 ms have elapsed on the lock; push it past 30 s.
    clock.advance(Duration::from_millis(27_701));
    assert!(!session.has_valid_lock());
    assert!(session.locked_face().is_none());
}

#[test]
fn lock_ttl_boundary_through_session() {
    let clock = ManualClock::new();
    let mut session = session(&clock, FaceDetector::heuristic());
    let frame = synthetic_face();
    let result = session.detect_face(Some(&frame));
    assert!(session.lock_face(&frame, &result));

    clock.advance(Duration::from_millis(29_999));
    assert!(session.has_valid_lock());
    assert_eq!(session.lock_remaining(), Some(Duration::from_millis(1)));

    clock.advance(Duration::from_millis(2));
    assert!(!session.has_valid_lock());
    assert_eq!(session.detect_mood_from_locked_face(), Err(MoodError::NoValidLock));
}

#[test]
fn clear_lock_drops_snapshot() {
    let clock = ManualClock::new();
    let mut session = session(&clock, FaceDetector::heuristic());
    let frame = synthetic_face();
    let result = session.detect_face(Some(&frame));
    assert!(session.lock_face(&frame, &result));
    session.clear_lock();
    assert!(!session.has_valid_lock());
}

struct CenteredNative;

impl NativeFaceDetector for CenteredNative {
    fn try_detect(&self, frame: &Frame) -> Result<Vec<Rect>, NativeDetectionError> {
        let (w, h) = (frame.width as f32, frame.height as f32);
        Ok(vec![Rect::new(w * 0.25, h * 0.15, w * 0.5, h * 0.7)])
    }
}

struct BrokenNative;

impl NativeFaceDetector for BrokenNative {
    fn try_detect(&self, _frame: &Frame) -> Result<Vec<Rect>, NativeDetectionError> {
        Err(NativeDetectionError::Unavailable("not supported".into()))
    }
}

#[test]
fn native_path_validates_synthetic_face() {
    let clock = ManualClock::new();
    let mut session = session(&clock, FaceDetector::with_native(Box::new(CenteredNative)));
    let frame = synthetic_face();

    let result = session.detect_face(Some(&frame));
    assert_eq!(result.detection_method, DetectionMethod::Native);
    assert!(result.is_human);
    assert!(result.face_detected);
    assert!(result.confidence > 0.7 && result.confidence <= 0.98);
    assert!(session.lock_face(&frame, &result));
}

#[test]
fn broken_native_falls_back_within_cycle() {
    let clock = ManualClock::new();
    let session = session(&clock, FaceDetector::with_native(Box::new(BrokenNative)));
    let result = session.detect_face(Some(&synthetic_face()));
    assert_eq!(result.detection_method, DetectionMethod::Heuristic);
    assert!(result.face_detected);
}

#[test]
fn independent_sessions_do_not_share_locks() {
    let clock = ManualClock::new();
    let mut a = session(&clock, FaceDetector::heuristic());
    let mut b = session(&clock, FaceDetector::heuristic());
    let frame = synthetic_face();
    let result = a.detect_face(Some(&frame));
    assert!(a.lock_face(&frame, &result));
    assert!(a.has_valid_lock());
    assert!(!b.has_valid_lock());
}
