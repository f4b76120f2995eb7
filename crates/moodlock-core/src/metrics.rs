//! Pixel metrics over raw RGBA regions.
//!
//! Every function is pure, tolerates empty or truncated buffers, and returns
//! a score in `[0, 1]`.

use crate::frame::brightness;
use serde::{Deserialize, Serialize};

// --- Named constants ---
const SYMMETRY_STEP: usize = 4;
const EYE_BAND_TOP: f32 = 0.2;
const EYE_BAND_HEIGHT: f32 = 0.3;
const EYE_COLUMN_STEP: usize = 2;
const EYE_DARK_THRESHOLD: f32 = 80.0;
const EYE_DARK_MIN: f32 = 0.1;
const EYE_DARK_MAX: f32 = 0.6;
const IDEAL_ASPECT: f32 = 0.75;
const CONTRAST_SPAN: f32 = 150.0;

/// The six per-region scores fused by the region scorer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceMetrics {
    pub skin_tone: f32,
    pub symmetry: f32,
    pub proportions: f32,
    pub eye_region: f32,
    pub contrast: f32,
    pub lighting: f32,
}

impl FaceMetrics {
    /// Measure all six metrics over one RGBA region.
    pub fn measure(rgba: &[u8], width: u32, height: u32) -> Self {
        Self {
            skin_tone: skin_tone_ratio(rgba),
            symmetry: symmetry(rgba, width, height),
            proportions: face_proportions(width, height),
            eye_region: eye_region_darkness(rgba, width, height),
            contrast: contrast(rgba),
            lighting: lighting(rgba),
        }
    }

    pub fn as_array(&self) -> [f32; 6] {
        [
            self.skin_tone,
            self.symmetry,
            self.proportions,
            self.eye_region,
            self.contrast,
            self.lighting,
        ]
    }
}

/// True when an RGB triple falls into one of the skin-tone bands
/// (light, very light, darker).
pub fn is_skin_tone(r: u8, g: u8, b: u8) -> bool {
    let (ri, gi, bi) = (r as i32, g as i32, b as i32);
    let max = ri.max(gi).max(bi);
    let min = ri.min(gi).min(bi);

    let light = ri > 95
        && gi > 40
        && bi > 20
        && max - min > 15
        && (ri - gi).abs() > 15
        && ri > gi
        && ri > bi;
    let very_light = ri > 220
        && gi > 210
        && bi > 170
        && (ri - gi).abs() <= 15
        && ri > bi
        && gi > bi;
    let darker = ri > 50 && ri < 120 && gi > 30 && gi < 90 && bi > 15 && bi < 60;

    light || very_light || darker
}

/// Fraction of pixels classified as skin.
pub fn skin_tone_ratio(rgba: &[u8]) -> f32 {
    let mut total = 0usize;
    let mut skin = 0usize;
    for px in rgba.chunks_exact(4) {
        if is_skin_tone(px[0], px[1], px[2]) {
            skin += 1;
        }
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }
    skin as f32 / total as f32
}

/// Left/right brightness symmetry, sampled every 4 px on both axes.
pub fn symmetry(rgba: &[u8], width: u32, height: u32) -> f32 {
    let w = width as usize;
    let h = height as usize;
    let center = w / 2;

    let mut score = 0.0f32;
    let mut comparisons = 0usize;

    for y in (0..h).step_by(SYMMETRY_STEP) {
        for x in (1..center).step_by(SYMMETRY_STEP) {
            let left = (y * w + x) * 4;
            let right = (y * w + (w - x - 1)) * 4;
            let (Some(l), Some(r)) = (rgba.get(left..left + 3), rgba.get(right..right + 3)) else {
                continue;
            };
            let diff = (brightness(l[0], l[1], l[2]) - brightness(r[0], r[1], r[2])).abs();
            score += (1.0 - diff / 255.0).max(0.0);
            comparisons += 1;
        }
    }

    if comparisons == 0 {
        return 0.0;
    }
    score / comparisons as f32
}

/// Aspect-ratio closeness to 3:4 (weight 0.7) plus a coarse size gate (weight 0.3).
pub fn face_proportions(width: u32, height: u32) -> f32 {
    if width == 0 || height == 0 {
        return 0.0;
    }
    let aspect = width as f32 / height as f32;
    let ratio_score = 1.0 - (aspect - IDEAL_ASPECT).abs() / IDEAL_ASPECT;
    let size_score = if width > 80 && height > 100 && width < 400 && height < 500 {
        1.0
    } else {
        0.3
    };
    (ratio_score * 0.7 + size_score * 0.3).clamp(0.0, 1.0)
}

/// Dark-pixel share in the eye band `[0.2h, 0.5h)`.
///
/// Scores zero unless the band is partly (10–60%) dark, then `2 × fraction`.
pub fn eye_region_darkness(rgba: &[u8], width: u32, height: u32) -> f32 {
    let w = width as usize;
    let h = height as usize;
    let top = (h as f32 * EYE_BAND_TOP).floor() as usize;
    let band = (h as f32 * EYE_BAND_HEIGHT).floor() as usize;

    let mut dark = 0usize;
    let mut total = 0usize;

    for y in top..(top + band).min(h) {
        for x in (0..w).step_by(EYE_COLUMN_STEP) {
            let idx = (y * w + x) * 4;
            let Some(px) = rgba.get(idx..idx + 3) else {
                continue;
            };
            if brightness(px[0], px[1], px[2]) < EYE_DARK_THRESHOLD {
                dark += 1;
            }
            total += 1;
        }
    }

    if total == 0 {
        return 0.0;
    }
    let ratio = dark as f32 / total as f32;
    if ratio > EYE_DARK_MIN && ratio < EYE_DARK_MAX {
        (ratio * 2.0).min(1.0)
    } else {
        0.0
    }
}

/// Brightness range over the region, normalised by 150.
pub fn contrast(rgba: &[u8]) -> f32 {
    let mut min = 255.0f32;
    let mut max = 0.0f32;
    for px in rgba.chunks_exact(4) {
        let b = brightness(px[0], px[1], px[2]);
        min = min.min(b);
        max = max.max(b);
    }
    ((max - min) / CONTRAST_SPAN).clamp(0.0, 1.0)
}

/// Tiered score for average brightness: 1.0 in `[80,180]`, 0.7 in `[60,220]`, else 0.3.
pub fn lighting(rgba: &[u8]) -> f32 {
    let pixels = rgba.len() / 4;
    if pixels == 0 {
        return 0.0;
    }
    let avg = rgba
        .chunks_exact(4)
        .map(|px| brightness(px[0], px[1], px[2]))
        .sum::<f32>()
        / pixels as f32;

    if (80.0..=180.0).contains(&avg) {
        1.0
    } else if (60.0..=220.0).contains(&avg) {
        0.7
    } else {
        0.3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        [rgb[0], rgb[1], rgb[2], 255]
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect()
    }

    fn in_unit(v: f32) -> bool {
        (0.0..=1.0).contains(&v)
    }

    #[test]
    fn test_skin_tone_bands() {
        assert!(is_skin_tone(200, 150, 120)); // light
        assert!(is_skin_tone(240, 230, 200)); // very light
        assert!(is_skin_tone(90, 60, 40)); // darker
        assert!(!is_skin_tone(128, 128, 128)); // gray
        assert!(!is_skin_tone(20, 20, 200)); // blue
        assert!(!is_skin_tone(0, 0, 0));
    }

    #[test]
    fn test_skin_tone_ratio_mixed() {
        let mut data = solid(2, 1, [200, 150, 120]);
        data.extend(solid(2, 1, [0, 0, 0]));
        assert!((skin_tone_ratio(&data) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_all_black_extremes() {
        let data = solid(32, 32, [0, 0, 0]);
        assert_eq!(skin_tone_ratio(&data), 0.0);
        assert_eq!(contrast(&data), 0.0);
        assert_eq!(lighting(&data), 0.3);
        // Entirely dark band is outside (0.1, 0.6)
        assert_eq!(eye_region_darkness(&data, 32, 32), 0.0);
        assert!((symmetry(&data, 32, 32) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_all_white_extremes() {
        let data = solid(32, 32, [255, 255, 255]);
        assert_eq!(skin_tone_ratio(&data), 0.0);
        assert_eq!(contrast(&data), 0.0);
        assert_eq!(lighting(&data), 0.3);
        assert_eq!(eye_region_darkness(&data, 32, 32), 0.0);
    }

    #[test]
    fn test_single_pixel() {
        let data = solid(1, 1, [200, 150, 120]);
        assert_eq!(skin_tone_ratio(&data), 1.0);
        // No pairs to compare
        assert_eq!(symmetry(&data, 1, 1), 0.0);
        assert_eq!(contrast(&data), 0.0);
        assert_eq!(lighting(&data), 1.0);
        assert!(in_unit(face_proportions(1, 1)));
    }

    #[test]
    fn test_empty_region_scores_zero() {
        assert_eq!(skin_tone_ratio(&[]), 0.0);
        assert_eq!(symmetry(&[], 0, 0), 0.0);
        assert_eq!(face_proportions(0, 0), 0.0);
        assert_eq!(eye_region_darkness(&[], 0, 0), 0.0);
        assert_eq!(contrast(&[]), 0.0);
        assert_eq!(lighting(&[]), 0.0);
    }

    #[test]
    fn test_truncated_buffer_does_not_panic() {
        // Claims 64x64 but only carries 10 pixels
        let data = solid(10, 1, [90, 60, 40]);
        assert!(in_unit(symmetry(&data, 64, 64)));
        assert!(in_unit(eye_region_darkness(&data, 64, 64)));
    }

    #[test]
    fn test_lighting_tiers() {
        assert_eq!(lighting(&solid(2, 2, [80, 80, 80])), 1.0);
        assert_eq!(lighting(&solid(2, 2, [180, 180, 180])), 1.0);
        assert_eq!(lighting(&solid(2, 2, [60, 60, 60])), 0.7);
        assert_eq!(lighting(&solid(2, 2, [220, 220, 220])), 0.7);
        assert_eq!(lighting(&solid(2, 2, [59, 59, 59])), 0.3);
        assert_eq!(lighting(&solid(2, 2, [221, 221, 221])), 0.3);
    }

    #[test]
    fn test_contrast_normalised() {
        let mut data = solid(1, 1, [0, 0, 0]);
        data.extend(solid(1, 1, [75, 75, 75]));
        assert!((contrast(&data) - 0.5).abs() < 1e-6);

        let mut full = solid(1, 1, [0, 0, 0]);
        full.extend(solid(1, 1, [255, 255, 255]));
        assert_eq!(contrast(&full), 1.0);
    }

    #[test]
    fn test_symmetry_detects_asymmetry() {
        // Left half black, right half white
        let (w, h) = (16u32, 8u32);
        let mut data = Vec::new();
        for _y in 0..h {
            for x in 0..w {
                let v = if x < w / 2 { 0 } else { 255 };
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        assert!(symmetry(&data, w, h) < 0.01);
    }

    #[test]
    fn test_face_proportions() {
        // Ideal aspect, plausible size
        assert!((face_proportions(150, 200) - 1.0).abs() < 1e-6);
        // Ideal aspect, implausible size: 0.7 + 0.3 * 0.3
        assert!((face_proportions(600, 800) - 0.79).abs() < 1e-5);
        // Extremely wide clamps at zero ratio contribution
        assert!(in_unit(face_proportions(4000, 10)));
    }

    #[test]
    fn test_eye_region_partial_darkness() {
        // 10x10 region, band rows 2..5, every other column dark in the band.
        let (w, h) = (10u32, 10u32);
        let mut data = Vec::new();
        for y in 0..h {
            for x in 0..w {
                let dark = (2..5).contains(&y) && x % 4 == 0;
                let v = if dark { 10 } else { 150 };
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        // Sampled columns 0,2,4,6,8 → dark at 0,4,8 = 3/5
        // 0.6 is outside the open interval → 0
        assert_eq!(eye_region_darkness(&data, w, h), 0.0);

        let mut data = Vec::new();
        for y in 0..h {
            for x in 0..w {
                let dark = (2..5).contains(&y) && x % 8 == 0;
                let v = if dark { 10 } else { 150 };
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        // Dark at columns 0 and 8 → 2/5 = 0.4 → 0.8
        assert!((eye_region_darkness(&data, w, h) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_measure_in_unit_range() {
        let mut data = Vec::new();
        for i in 0..(48 * 64) {
            let v = (i * 37 % 256) as u8;
            data.extend_from_slice(&[v, v.wrapping_mul(3), v.wrapping_add(90), 255]);
        }
        let m = FaceMetrics::measure(&data, 48, 64);
        for v in m.as_array() {
            assert!(in_unit(v), "metric out of range: {v}");
        }
    }
}
