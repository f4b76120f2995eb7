use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Axis-aligned rectangle in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Grow the rectangle by `padding` on every side.
    pub fn padded(&self, padding: f32) -> Rect {
        Rect {
            x: self.x - padding,
            y: self.y - padding,
            width: self.width + padding * 2.0,
            height: self.height + padding * 2.0,
        }
    }

    /// Integer pixel bounds `(x, y, width, height)` of the part of this
    /// rectangle that lies inside a `frame_width` × `frame_height` frame.
    ///
    /// Returns `None` when the intersection is empty.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<(u32, u32, u32, u32)> {
        let finite = self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite();
        if !finite {
            return None;
        }
        let x0 = self.x.floor().max(0.0);
        let y0 = self.y.floor().max(0.0);
        let x1 = (self.x + self.width).floor().min(frame_width as f32);
        let y1 = (self.y + self.height).floor().min(frame_height as f32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

/// Face quality tier, derived from blended confidence and human score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl FaceQuality {
    /// Tier a blended score: `>= 0.85` excellent, `>= 0.70` good, `>= 0.55` fair.
    pub fn from_overall(overall: f32) -> Self {
        if overall >= 0.85 {
            FaceQuality::Excellent
        } else if overall >= 0.70 {
            FaceQuality::Good
        } else if overall >= 0.55 {
            FaceQuality::Fair
        } else {
            FaceQuality::Poor
        }
    }

    /// Tier from a confidence and a human score, averaged.
    pub fn from_scores(confidence: f32, human_score: f32) -> Self {
        Self::from_overall((confidence + human_score) / 2.0)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FaceQuality::Excellent => "excellent",
            FaceQuality::Good => "good",
            FaceQuality::Fair => "fair",
            FaceQuality::Poor => "poor",
        }
    }
}

impl fmt::Display for FaceQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which detection path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    /// Host-provided face detector, re-validated for human skin/contrast/lighting.
    Native,
    /// Multi-region pixel heuristic sweep.
    Heuristic,
    /// No usable frame was available for this cycle.
    Unavailable,
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DetectionMethod::Native => "native face detector",
            DetectionMethod::Heuristic => "heuristic region analysis",
            DetectionMethod::Unavailable => "frame unavailable",
        })
    }
}

/// Outcome of one detection cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceDetectionResult {
    pub face_detected: bool,
    pub is_human: bool,
    pub confidence: f32,
    pub face_count: u32,
    pub face_quality: FaceQuality,
    pub detection_method: DetectionMethod,
    /// Present only when `is_human` is true.
    pub face_region: Option<Rect>,
}

impl FaceDetectionResult {
    /// Canonical "nothing found" result tagged with the path that produced it.
    pub fn empty(method: DetectionMethod) -> Self {
        Self {
            face_detected: false,
            is_human: false,
            confidence: 0.0,
            face_count: 0,
            face_quality: FaceQuality::Poor,
            detection_method: method,
            face_region: None,
        }
    }

    /// True when the result carries everything a lock needs.
    pub fn is_lockable(&self) -> bool {
        self.is_human && self.face_detected && self.face_region.is_some()
    }
}

/// Mood labels produced by the inference stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Energetic,
    Relaxed,
    Surprised,
    Angry,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Energetic,
        Emotion::Relaxed,
        Emotion::Surprised,
        Emotion::Angry,
        Emotion::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Energetic => "energetic",
            Emotion::Relaxed => "relaxed",
            Emotion::Surprised => "surprised",
            Emotion::Angry => "angry",
            Emotion::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one mood inference call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodDetectionResult {
    pub success: bool,
    pub emotion: Emotion,
    pub confidence: f32,
    pub used_locked_face: bool,
    /// Wall-clock time from call entry to completion.
    pub processing_time: Duration,
}
