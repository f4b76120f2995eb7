//! Detection strategy selector.
//!
//! Tries a host-provided face detector first and falls back to a heuristic
//! multi-region sweep. Both paths produce the same [`FaceDetectionResult`].

use crate::frame::{Frame, MAX_ANALYSIS_HEIGHT, MAX_ANALYSIS_WIDTH};
use crate::metrics;
use crate::scorer::{self, RegionScore};
use crate::types::{DetectionMethod, FaceDetectionResult, FaceQuality, Rect};
use thiserror::Error;

// --- Named constants ---
const CENTER_WEIGHT: f32 = 0.6;
const SIZE_WEIGHT: f32 = 0.4;
const MAX_AREA_SHARE: f32 = 0.5;
const NATIVE_CONFIDENCE_CAP: f32 = 0.98;
const HEURISTIC_CONFIDENCE_CAP: f32 = 0.95;
const HUMAN_CHECK_THRESHOLD: f32 = 0.4;

#[derive(Error, Debug)]
pub enum NativeDetectionError {
    #[error("native detector unavailable: {0}")]
    Unavailable(String),
    #[error("native detection failed: {0}")]
    Failed(String),
}

/// Host-provided face detection capability.
///
/// Implementations return zero or more candidate rectangles in the
/// coordinates of the frame they were given. They are not expected to
/// tell human faces apart from face-like patterns.
pub trait NativeFaceDetector: Send + Sync {
    fn try_detect(&self, frame: &Frame) -> Result<Vec<Rect>, NativeDetectionError>;
}

/// Outcome of the lightweight human check run on native candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HumanCheck {
    pub is_human: bool,
    pub confidence: f32,
}

/// Picks a detection path per cycle and normalises its output.
pub struct FaceDetector {
    native: Option<Box<dyn NativeFaceDetector>>,
    max_width: u32,
    max_height: u32,
}

impl Default for FaceDetector {
    fn default() -> Self {
        Self::heuristic()
    }
}

impl FaceDetector {
    /// Heuristic sweep only.
    pub fn heuristic() -> Self {
        Self {
            native: None,
            max_width: MAX_ANALYSIS_WIDTH,
            max_height: MAX_ANALYSIS_HEIGHT,
        }
    }

    /// Native detector first, heuristic sweep as fallback.
    pub fn with_native(native: Box<dyn NativeFaceDetector>) -> Self {
        Self {
            native: Some(native),
            ..Self::heuristic()
        }
    }

    /// Override the analysis resolution cap.
    pub fn with_max_dimensions(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width.max(1);
        self.max_height = max_height.max(1);
        self
    }

    /// Run one detection cycle.
    ///
    /// Never fails: a missing or zero-sized frame yields the empty result
    /// tagged [`DetectionMethod::Unavailable`]. The returned `face_region`
    /// is in the coordinates of `frame`, even when analysis ran on a
    /// downsampled copy.
    pub fn detect(&self, frame: Option<&Frame>) -> FaceDetectionResult {
        let Some(frame) = frame.filter(|f| !f.is_empty()) else {
            tracing::debug!("no usable frame for detection cycle");
            return FaceDetectionResult::empty(DetectionMethod::Unavailable);
        };

        let scaled = frame.downsample(self.max_width, self.max_height);
        let analysis = scaled.as_ref().unwrap_or(frame);

        let mut result = self
            .detect_native(analysis)
            .unwrap_or_else(|| detect_heuristic(analysis));

        if scaled.is_some() {
            let sx = frame.width as f32 / analysis.width as f32;
            let sy = frame.height as f32 / analysis.height as f32;
            result.face_region = result.face_region.map(|r| Rect {
                x: r.x * sx,
                y: r.y * sy,
                width: r.width * sx,
                height: r.height * sy,
            });
        }

        tracing::debug!(
            method = ?result.detection_method,
            face_detected = result.face_detected,
            is_human = result.is_human,
            confidence = result.confidence,
            quality = %result.face_quality,
            "detection cycle complete"
        );
        result
    }

    /// Native path. `None` means "fall through to the heuristic sweep".
    fn detect_native(&self, frame: &Frame) -> Option<FaceDetectionResult> {
        let native = self.native.as_ref()?;
        let candidates = match native.try_detect(frame) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(error = %e, "native face detection failed; using heuristic sweep");
                return None;
            }
        };
        if candidates.is_empty() {
            return None;
        }
        Some(validate_native(frame, &candidates))
    }
}

/// Score native candidates, keep the best one and re-validate it as human.
///
/// A candidate must place strictly above zero to be considered; when none
/// does, the cycle reports no face without falling back to the sweep.
fn validate_native(frame: &Frame, candidates: &[Rect]) -> FaceDetectionResult {
    let mut best: Option<(Rect, f32)> = None;
    for candidate in candidates {
        let score = placement_score(candidate, frame.width, frame.height);
        if score > best.map_or(0.0, |(_, s)| s) {
            best = Some((*candidate, score));
        }
    }
    let Some((best, geometric)) = best else {
        tracing::debug!(
            candidates = candidates.len(),
            "no native candidate placed inside the frame"
        );
        return FaceDetectionResult::empty(DetectionMethod::Native);
    };

    let check = human_check(frame, &best);

    FaceDetectionResult {
        face_detected: check.is_human,
        is_human: check.is_human,
        confidence: (geometric * check.confidence).clamp(0.0, NATIVE_CONFIDENCE_CAP),
        face_count: candidates.len() as u32,
        face_quality: FaceQuality::from_scores(geometric, check.confidence),
        detection_method: DetectionMethod::Native,
        face_region: check.is_human.then_some(best),
    }
}

/// How well a candidate is placed: `0.6 · centeredness + 0.4 · size`.
pub fn placement_score(rect: &Rect, frame_width: u32, frame_height: u32) -> f32 {
    let half_w = frame_width as f32 / 2.0;
    let half_h = frame_height as f32 / 2.0;
    if half_w <= 0.0 || half_h <= 0.0 {
        return 0.0;
    }
    let (cx, cy) = rect.center();
    let centeredness = 1.0 - ((cx - half_w).abs() / half_w + (cy - half_h).abs() / half_h) / 2.0;
    let frame_area = frame_width as f32 * frame_height as f32;
    let size = (rect.area() / frame_area).min(MAX_AREA_SHARE) * 2.0;
    centeredness * CENTER_WEIGHT + size * SIZE_WEIGHT
}

/// Skin/contrast/lighting check for a region found by the native detector.
pub fn human_check(frame: &Frame, rect: &Rect) -> HumanCheck {
    let Some((pixels, _, _)) = frame.region(rect) else {
        return HumanCheck {
            is_human: false,
            confidence: 0.0,
        };
    };
    let confidence = metrics::skin_tone_ratio(&pixels) * 0.5
        + metrics::contrast(&pixels) * 0.3
        + metrics::lighting(&pixels) * 0.2;
    HumanCheck {
        is_human: confidence > HUMAN_CHECK_THRESHOLD,
        confidence,
    }
}

/// Score every sweep region of `frame`. Regions that fall outside the frame
/// score as empty buffers (all zeros).
pub fn analyze_regions(frame: &Frame) -> Vec<(Rect, RegionScore)> {
    scorer::sweep_regions(frame.width, frame.height)
        .into_iter()
        .map(|rect| {
            let score = match frame.region(&rect) {
                Some((pixels, w, h)) => scorer::score_region(&pixels, w, h),
                None => scorer::score_region(&[], 0, 0),
            };
            (rect, score)
        })
        .collect()
}

/// Heuristic sweep over the nested regions of `frame`.
fn detect_heuristic(frame: &Frame) -> FaceDetectionResult {
    select_region(analyze_regions(frame))
}

/// Keep the region with the strictly highest reported confidence.
fn select_region(scored: Vec<(Rect, RegionScore)>) -> FaceDetectionResult {
    let mut best = FaceDetectionResult::empty(DetectionMethod::Heuristic);
    let mut highest = 0.0f32;

    for (rect, score) in scored {
        tracing::trace!(
            ?rect,
            human_score = score.human_score,
            confidence = score.confidence,
            "region scored"
        );
        // Compared after capping, so ties above the cap keep the earliest region.
        let confidence = score.confidence.min(HEURISTIC_CONFIDENCE_CAP);
        if confidence > highest {
            highest = confidence;
            best = FaceDetectionResult {
                face_detected: score.face_detected,
                is_human: score.is_human,
                confidence,
                face_count: u32::from(score.is_human),
                face_quality: score.quality,
                detection_method: DetectionMethod::Heuristic,
                face_region: (score.face_detected && score.is_human).then_some(rect),
            };
        }
    }

    best
}
