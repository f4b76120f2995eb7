//! Region scorer: fuses pixel metrics into a human-face probability.

use crate::metrics::FaceMetrics;
use crate::types::{FaceQuality, Rect};
use serde::{Deserialize, Serialize};

// --- Fusion weights (sum to 1.0) ---
const WEIGHT_SKIN_TONE: f32 = 0.25;
const WEIGHT_SYMMETRY: f32 = 0.20;
const WEIGHT_PROPORTIONS: f32 = 0.20;
const WEIGHT_EYE_REGION: f32 = 0.15;
const WEIGHT_CONTRAST: f32 = 0.10;
const WEIGHT_LIGHTING: f32 = 0.10;

const STRONG_METRIC: f32 = 0.7;
const STRONG_METRIC_COUNT: usize = 3;
const STRONG_BOOST: f32 = 0.1;
pub const HUMAN_THRESHOLD: f32 = 0.65;
pub const DETECTION_THRESHOLD: f32 = 0.6;

/// Nested candidate regions `(x, y, w, h)` as fractions of the frame,
/// all centered horizontally: 50%, 60% and 70% of the width.
pub const SWEEP_REGIONS: [(f32, f32, f32, f32); 3] = [
    (0.25, 0.15, 0.5, 0.7),
    (0.2, 0.1, 0.6, 0.8),
    (0.15, 0.05, 0.7, 0.9),
];

/// Scores for one candidate region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionScore {
    pub metrics: FaceMetrics,
    pub human_score: f32,
    /// `human_score` plus the strong-metric boost, capped at 1.
    pub confidence: f32,
    pub is_human: bool,
    pub face_detected: bool,
    pub quality: FaceQuality,
}

/// Weighted sum of the six metrics.
pub fn human_score(m: &FaceMetrics) -> f32 {
    m.skin_tone * WEIGHT_SKIN_TONE
        + m.symmetry * WEIGHT_SYMMETRY
        + m.proportions * WEIGHT_PROPORTIONS
        + m.eye_region * WEIGHT_EYE_REGION
        + m.contrast * WEIGHT_CONTRAST
        + m.lighting * WEIGHT_LIGHTING
}

/// Fuse already-measured metrics into a region score.
pub fn score_metrics(metrics: FaceMetrics) -> RegionScore {
    let human = human_score(&metrics);
    let strong = metrics
        .as_array()
        .iter()
        .filter(|&&v| v > STRONG_METRIC)
        .count();
    let boost = if strong > STRONG_METRIC_COUNT { STRONG_BOOST } else { 0.0 };
    let confidence = (human + boost).min(1.0);
    let is_human = human > HUMAN_THRESHOLD;

    RegionScore {
        metrics,
        human_score: human,
        confidence,
        is_human,
        face_detected: is_human && confidence > DETECTION_THRESHOLD,
        quality: FaceQuality::from_scores(confidence, human),
    }
}

/// Measure and score one RGBA region.
pub fn score_region(rgba: &[u8], width: u32, height: u32) -> RegionScore {
    score_metrics(FaceMetrics::measure(rgba, width, height))
}

/// The sweep rectangles for a `width` × `height` frame.
pub fn sweep_regions(width: u32, height: u32) -> [Rect; 3] {
    let (w, h) = (width as f32, height as f32);
    SWEEP_REGIONS.map(|(fx, fy, fw, fh)| {
        Rect::new((w * fx).round(), (h * fy).round(), (w * fw).round(), (h * fh).round())
    })
}
